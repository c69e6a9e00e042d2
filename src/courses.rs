//! Health listing of configured course folders (`brief courses`).

use anyhow::Result;

use crate::config::Config;
use crate::store::DocumentStore;

/// Health of one configured course folder.
#[derive(Debug, Clone)]
pub struct CourseStatus {
    pub name: String,
    pub folder: String,
    pub subject: Option<String>,
    /// Number of listed documents, or the listing error.
    pub listing: Result<usize, String>,
}

impl CourseStatus {
    pub fn is_healthy(&self) -> bool {
        self.listing.is_ok()
    }
}

/// Lists every configured course folder once.
pub async fn course_statuses(config: &Config, store: &dyn DocumentStore) -> Vec<CourseStatus> {
    let mime_filter = config.matching.mime_filter.as_deref();
    let mut statuses = Vec::new();
    for (name, course) in &config.courses {
        let listing = match tokio::time::timeout(
            config.timeouts.list(),
            store.list(&course.material_folder(), mime_filter),
        )
        .await
        {
            Ok(Ok(docs)) => Ok(docs.len()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {}s", config.timeouts.list_secs)),
        };
        statuses.push(CourseStatus {
            name: name.clone(),
            folder: course.folder.clone(),
            subject: course.subject.clone(),
            listing,
        });
    }
    statuses
}

pub async fn list_courses(config: &Config, store: &dyn DocumentStore) -> Result<()> {
    let statuses = course_statuses(config, store).await;

    println!("{:<16} {:<24} {:<10} DOCUMENTS", "COURSE", "FOLDER", "STATUS");
    for status in &statuses {
        let (state, detail) = match &status.listing {
            Ok(count) => ("OK", count.to_string()),
            Err(e) => ("ERROR", e.clone()),
        };
        println!(
            "{:<16} {:<24} {:<10} {}",
            status.name, status.folder, state, detail
        );
    }

    Ok(())
}
