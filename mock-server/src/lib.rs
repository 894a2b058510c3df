use std::{sync::Arc, time::Duration};

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub image: String,
    pub department: String,
    pub title: String,
    pub bio: String,
    pub twitter: String,
}

#[derive(Clone, Debug)]
pub struct Directory {
    pub staff: Arc<Vec<Staff>>,
    /// Delay applied before every staff list response.
    pub latency: Duration,
}

/// The staff list served by `app()`.
pub fn fixture_staff() -> Vec<Staff> {
    vec![
        Staff {
            id: 1,
            name: "Ada".to_string(),
            mobile: "555-1234".to_string(),
            email: "a@x.com".to_string(),
            image: String::new(),
            department: "Eng".to_string(),
            title: "Dev".to_string(),
            bio: String::new(),
            twitter: String::new(),
        },
        Staff {
            id: 2,
            name: "Grace Hopper".to_string(),
            mobile: "(555) 987-6543".to_string(),
            email: "grace@deskbook.test".to_string(),
            image: "https://deskbook.test/img/grace.png".to_string(),
            department: "Research".to_string(),
            title: "Rear Admiral".to_string(),
            bio: "<p>Wrote the first compiler.</p>".to_string(),
            twitter: "@grace".to_string(),
        },
        Staff {
            id: 3,
            name: "Edsger Dijkstra".to_string(),
            mobile: "+31 20 555 0100".to_string(),
            email: "ewd@deskbook.test".to_string(),
            image: "https://deskbook.test/img/ewd.png".to_string(),
            department: "Research".to_string(),
            title: "Professor".to_string(),
            bio: "<p>Shortest paths.</p>".to_string(),
            twitter: String::new(),
        },
    ]
}

pub fn app() -> Router {
    app_with(fixture_staff(), Duration::ZERO)
}

pub fn app_with(staff: Vec<Staff>, latency: Duration) -> Router {
    let directory = Directory {
        staff: Arc::new(staff),
        latency,
    };
    Router::new()
        .route("/api/staff2", get(list_staff))
        .route("/api/broken/staff2", get(broken_staff))
        .with_state(directory)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn list_staff(State(directory): State<Directory>) -> Json<Vec<Staff>> {
    if !directory.latency.is_zero() {
        tokio::time::sleep(directory.latency).await;
    }
    tracing::debug!(count = directory.staff.len(), "serving staff list");
    Json(directory.staff.as_ref().clone())
}

/// Answers 200 with a body that is valid JSON but not a staff array.
async fn broken_staff() -> impl IntoResponse {
    Json(serde_json::json!({ "not": "an array" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_serializes_twitter_key() {
        let staff = fixture_staff().remove(1);
        let json = serde_json::to_value(&staff).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["twitter"], "@grace");
    }

    #[test]
    fn fixture_ids_are_unique() {
        let staff = fixture_staff();
        let mut ids: Vec<i64> = staff.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), staff.len());
    }

    #[test]
    fn staff_rejects_missing_field() {
        let result: Result<Staff, _> = serde_json::from_str(r#"{"id":1,"name":"Ada"}"#);
        assert!(result.is_err());
    }
}
