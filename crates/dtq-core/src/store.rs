//! Task Store: the authoritative task_id -> Task map.
//!
//! The store itself has no opinion about what a legal transition is — it
//! only offers atomic get/insert/update under a single lock. The Coordinator
//! is the only caller and is where the state machine rules
//! actually live (in `coordinator::Coordinator`).

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{Task, TaskId};

pub struct TaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, task: Task) {
        let mut tasks = self.tasks.lock().await;
        tasks.insert(task.task_id, task);
    }

    pub async fn get(&self, task_id: TaskId) -> Option<Task> {
        let tasks = self.tasks.lock().await;
        tasks.get(&task_id).cloned()
    }

    /// Apply `f` to the task under the store's lock, if it exists, returning
    /// whatever `f` returns. This is the seam every state transition in
    /// `coordinator` goes through so no two callers can race on one task.
    pub async fn update<R>(&self, task_id: TaskId, f: impl FnOnce(&mut Task) -> R) -> Option<R> {
        let mut tasks = self.tasks.lock().await;
        tasks.get_mut(&task_id).map(f)
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot counts by status, for `Coordinator::metrics`.
    pub async fn counts_by_status(&self) -> HashMap<&'static str, u64> {
        use crate::domain::TaskStatus;

        let tasks = self.tasks.lock().await;
        let mut counts: HashMap<&'static str, u64> = HashMap::new();
        for task in tasks.values() {
            let key = match task.status {
                TaskStatus::Pending => "PENDING",
                TaskStatus::Running => "RUNNING",
                TaskStatus::Done => "DONE",
                TaskStatus::Failed => "FAILED",
                TaskStatus::Retrying => "RETRYING",
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Task, TaskId};

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = TaskStore::new();
        let task = Task::new(TaskId::new(), "add".into(), serde_json::json!({}), 3, 10);
        let id = task.task_id;
        store.insert(task).await;
        let got = store.get(id).await.unwrap();
        assert_eq!(got.task_id, id);
    }

    #[tokio::test]
    async fn get_of_unknown_task_is_none() {
        let store = TaskStore::new();
        assert!(store.get(TaskId::new()).await.is_none());
    }

    #[tokio::test]
    async fn update_mutates_in_place() {
        let store = TaskStore::new();
        let task = Task::new(TaskId::new(), "add".into(), serde_json::json!({}), 3, 10);
        let id = task.task_id;
        store.insert(task).await;

        store
            .update(id, |t| t.mark_running("w1"))
            .await
            .expect("task exists");

        let got = store.get(id).await.unwrap();
        assert_eq!(got.assigned_worker_id.as_deref(), Some("w1"));
    }
}
