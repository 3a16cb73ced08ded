//! Task calls: CRUD, workflow transitions, comments, history, reminders and
//! attachments.

use std::path::Path;

use reqwest::multipart;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::models::TaskQuery;

use super::client::{ApiRequest, Timeout};
use super::progress::{ProgressFn, ProgressTracker};
use super::unwrap;
use super::{ApiClient, ApiError, LogFailure};

/// Multipart field carrying the method override for upload requests.
const METHOD_OVERRIDE_FIELD: &str = "_method";

/// Repeated multipart field holding the uploaded files.
const ATTACHMENTS_FIELD: &str = "attachments[]";

/// A file to upload to a task.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: &str, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: None,
            data,
        }
    }

    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    /// Read a local file into memory.
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let data = std::fs::read(path).map_err(|source| ApiError::Attachment {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self::new(&file_name, data))
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Task call group, see [`ApiClient::tasks`].
pub struct Tasks<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn tasks(&self) -> Tasks<'_> {
        Tasks { client: self }
    }
}

impl Tasks<'_> {
    /// Tasks visible to the current user, optionally filtered.
    pub async fn list(&self, query: &TaskQuery) -> Result<Value, ApiError> {
        let request = ApiRequest::get("/tasks")
            .query_from(query)
            .log_failure("tasks.list")?;
        self.client.call("tasks.list", request, unwrap::TASKS).await
    }

    pub async fn get(&self, task_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::get(format!("/tasks/{}", task_id));
        self.client.call("tasks.get", request, unwrap::TASK).await
    }

    /// Create a task from a [`crate::models::TaskInput`] or any other
    /// serializable body.
    pub async fn create<B: Serialize + ?Sized>(&self, task: &B) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/tasks")
            .json_from(task)
            .log_failure("tasks.create")?;
        self.client.call("tasks.create", request, unwrap::TASK).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        task_id: i64,
        changes: &B,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::put(format!("/tasks/{}", task_id))
            .json_from(changes)
            .log_failure("tasks.update")?;
        self.client.call("tasks.update", request, unwrap::TASK).await
    }

    /// Replace the set of users assigned to a task.
    pub async fn assign_users(&self, task_id: i64, user_ids: &[i64]) -> Result<Value, ApiError> {
        let request = ApiRequest::put(format!("/tasks/{}/assign", task_id))
            .json(json!({ "assigned_users": user_ids }));
        self.client.call("tasks.assign_users", request, unwrap::TASK).await
    }

    /// Upload files to a task.
    ///
    /// Sent as a multipart POST carrying `_method=PUT`, one `attachments[]`
    /// part per file, with no request timeout. `on_progress` receives a
    /// 0-100 percentage as the body is streamed out.
    pub async fn upload_attachments(
        &self,
        task_id: i64,
        files: Vec<Attachment>,
        on_progress: Option<ProgressFn>,
    ) -> Result<Value, ApiError> {
        let total: u64 = files.iter().map(Attachment::len).sum();
        let tracker = ProgressTracker::new((total > 0).then_some(total), on_progress);
        debug!(task_id = task_id, files = files.len(), bytes = total, "Uploading attachments");

        let mut form = multipart::Form::new().text(METHOD_OVERRIDE_FIELD, "PUT");
        for file in files {
            let len = file.len();
            let body = reqwest::Body::wrap_stream(tracker.track(file.data));
            let mut part = multipart::Part::stream_with_length(body, len).file_name(file.file_name);
            if let Some(ref mime) = file.mime_type {
                part = part
                    .mime_str(mime)
                    .map_err(ApiError::Network)
                    .log_failure("tasks.upload_attachments")?;
            }
            form = form.part(ATTACHMENTS_FIELD, part);
        }

        let request = ApiRequest::post(format!("/tasks/{}", task_id))
            .multipart(form)
            .timeout(Timeout::Unbounded);
        self.client
            .call("tasks.upload_attachments", request, unwrap::TASK)
            .await
    }

    pub async fn delete(&self, task_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::delete(format!("/tasks/{}", task_id));
        self.client.call("tasks.delete", request, unwrap::BODY).await
    }

    pub async fn accept(&self, task_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/tasks/{}/accept", task_id));
        self.client.call("tasks.accept", request, unwrap::TASK).await
    }

    pub async fn reject(&self, task_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/tasks/{}/reject", task_id));
        self.client.call("tasks.reject", request, unwrap::TASK).await
    }

    /// Flip a task between open and completed.
    pub async fn toggle_status(&self, task_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/tasks/{}/toggle-status", task_id));
        self.client.call("tasks.toggle_status", request, unwrap::TASK).await
    }

    pub async fn mark_as_seen(&self, task_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/tasks/{}/seen", task_id));
        self.client.call("tasks.mark_as_seen", request, unwrap::BODY).await
    }

    /// Post the assignee's response to a task.
    pub async fn respond(&self, task_id: i64, response: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/tasks/{}/respond", task_id))
            .json(json!({ "response": response }));
        self.client.call("tasks.respond", request, unwrap::TASK).await
    }

    pub async fn comment(&self, task_id: i64, text: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/tasks/{}/comments", task_id))
            .json(json!({ "comment": text }));
        self.client.call("tasks.comment", request, unwrap::BODY).await
    }

    pub async fn delete_history(&self, task_id: i64, history_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::delete(format!("/tasks/{}/history/{}", task_id, history_id));
        self.client.call("tasks.delete_history", request, unwrap::BODY).await
    }

    /// Send a reminder to the given assignees, or to all of them when
    /// `user_ids` is `None`.
    pub async fn remind(&self, task_id: i64, user_ids: Option<&[i64]>) -> Result<Value, ApiError> {
        let body = match user_ids {
            Some(ids) => json!({ "user_ids": ids }),
            None => json!({}),
        };
        let request = ApiRequest::post(format!("/tasks/{}/remind", task_id)).json(body);
        self.client.call("tasks.remind", request, unwrap::BODY).await
    }

    pub async fn delete_attachment(&self, attachment_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::delete(format!("/attachments/{}", attachment_id));
        self.client.call("tasks.delete_attachment", request, unwrap::BODY).await
    }

    /// Change log of a task. Always a list; empty when the body has none.
    pub async fn get_history(&self, task_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::get(format!("/tasks/{}/history", task_id));
        self.client.call("tasks.get_history", request, unwrap::TASK_HISTORY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.file_name, "notes.txt");
        assert_eq!(attachment.len(), 5);
        assert!(attachment.mime_type.is_none());
    }

    #[test]
    fn test_attachment_from_missing_path() {
        let err = Attachment::from_path(Path::new("/definitely/not/here.bin")).unwrap_err();
        assert!(matches!(err, ApiError::Attachment { .. }));
    }
}
