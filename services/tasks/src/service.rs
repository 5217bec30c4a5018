//! Task mutation and query engine
//!
//! Every mutation takes the authenticated [`Caller`] explicitly, checks the
//! authorization policy, performs all loads and only then writes once. Writes
//! of loaded tasks go through the store's version check, so a concurrent
//! change surfaces as [`TaskError::Conflict`] instead of being overwritten.

use common::{identity::Caller, users::UserDirectory};
use tracing::{info, warn};

use crate::{
    error::{TaskError, TaskResult},
    filter::TaskFilter,
    models::{
        Comment, NewComment, NewTask, Page, PageRequest, Task, TaskDraft, TaskPriority,
        TaskStatus, TaskUpdate,
    },
    policy::{require_admin, require_assignee},
    repositories::TaskStore,
};

/// Task operations over a task store and a user directory
#[derive(Clone)]
pub struct TaskService<S, U> {
    store: S,
    users: U,
}

impl<S: TaskStore, U: UserDirectory> TaskService<S, U> {
    pub fn new(store: S, users: U) -> Self {
        Self { store, users }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    async fn load(&self, id: i64) -> TaskResult<Task> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| TaskError::task_not_found(id))
    }

    async fn require_user(&self, id: i64) -> TaskResult<()> {
        match self.users.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(TaskError::user_not_found(id)),
        }
    }

    /// Write a loaded task back; a missing row means the version moved on
    async fn persist(&self, task: &Task) -> TaskResult<Task> {
        match self.store.update(task).await? {
            Some(saved) => Ok(saved),
            None => {
                warn!("Task {} changed since version {}", task.id, task.version);
                Err(TaskError::Conflict(format!(
                    "Task {} was modified concurrently, reload and retry",
                    task.id
                )))
            }
        }
    }

    pub async fn create_task(&self, caller: &Caller, new_task: NewTask) -> TaskResult<Task> {
        require_admin(caller)?;
        require_title(&new_task.title)?;

        if let Some(assignee_id) = new_task.assignee_id {
            self.require_user(assignee_id).await?;
        }

        let draft = TaskDraft {
            title: new_task.title,
            description: new_task.description,
            status: new_task.status,
            priority: new_task.priority,
            author_id: caller.id,
            assignee_id: new_task.assignee_id,
        };
        let task = self.store.insert(&draft).await?;

        info!("Task {} created by {}", task.id, caller.username);
        Ok(task)
    }

    /// Replace every editable field of a task
    pub async fn update_task(
        &self,
        caller: &Caller,
        id: i64,
        update: TaskUpdate,
    ) -> TaskResult<Task> {
        require_admin(caller)?;
        require_title(&update.title)?;

        let mut task = self.load(id).await?;
        self.require_user(update.author_id).await?;
        if let Some(assignee_id) = update.assignee_id {
            self.require_user(assignee_id).await?;
        }

        task.title = update.title;
        task.description = update.description;
        task.status = update.status;
        task.priority = update.priority;
        task.author_id = update.author_id;
        task.assignee_id = update.assignee_id;

        let task = self.persist(&task).await?;
        info!("Task {} updated by {}", id, caller.username);
        Ok(task)
    }

    pub async fn delete_task(&self, caller: &Caller, id: i64) -> TaskResult<()> {
        require_admin(caller)?;
        self.load(id).await?;

        // A concurrent delete between load and delete still reports absence
        if !self.store.delete(id).await? {
            return Err(TaskError::task_not_found(id));
        }

        info!("Task {} deleted by {}", id, caller.username);
        Ok(())
    }

    pub async fn update_status(
        &self,
        caller: &Caller,
        id: i64,
        status: TaskStatus,
    ) -> TaskResult<Task> {
        require_admin(caller)?;

        let mut task = self.load(id).await?;
        task.status = status;
        self.persist(&task).await
    }

    pub async fn update_priority(
        &self,
        caller: &Caller,
        id: i64,
        priority: TaskPriority,
    ) -> TaskResult<Task> {
        require_admin(caller)?;

        let mut task = self.load(id).await?;
        task.priority = priority;
        self.persist(&task).await
    }

    pub async fn assign(&self, caller: &Caller, id: i64, assignee_id: i64) -> TaskResult<Task> {
        require_admin(caller)?;

        let mut task = self.load(id).await?;
        self.require_user(assignee_id).await?;

        task.assignee_id = Some(assignee_id);
        let task = self.persist(&task).await?;

        info!("Task {} assigned to user {}", id, assignee_id);
        Ok(task)
    }

    pub async fn add_comment(
        &self,
        caller: &Caller,
        id: i64,
        comment: Option<NewComment>,
    ) -> TaskResult<Comment> {
        require_admin(caller)?;
        let content = comment_content(comment)?;

        self.load(id).await?;
        self.append(caller, id, &content).await
    }

    /// Status change by the task's assignee
    pub async fn update_status_as_assignee(
        &self,
        caller: &Caller,
        id: i64,
        status: TaskStatus,
    ) -> TaskResult<Task> {
        let mut task = self.load(id).await?;
        require_assignee(caller, &task)?;

        task.status = status;
        self.persist(&task).await
    }

    /// Comment by the task's assignee
    pub async fn add_comment_as_assignee(
        &self,
        caller: &Caller,
        id: i64,
        comment: Option<NewComment>,
    ) -> TaskResult<Comment> {
        let content = comment_content(comment)?;

        let task = self.load(id).await?;
        require_assignee(caller, &task)?;

        self.append(caller, id, &content).await
    }

    async fn append(&self, caller: &Caller, id: i64, content: &str) -> TaskResult<Comment> {
        let comment = self
            .store
            .append_comment(id, caller.id, content)
            .await?
            .ok_or_else(|| TaskError::task_not_found(id))?;

        info!("Comment {} added to task {} by {}", comment.id, id, caller.username);
        Ok(comment)
    }

    pub async fn get_by_id(&self, id: i64) -> TaskResult<Task> {
        self.load(id).await
    }

    pub async fn get_by_author(&self, author_id: i64, page: PageRequest) -> TaskResult<Page<Task>> {
        self.get_all(TaskFilter::new().author(author_id), page).await
    }

    pub async fn get_by_assignee(
        &self,
        assignee_id: i64,
        page: PageRequest,
    ) -> TaskResult<Page<Task>> {
        self.get_all(TaskFilter::new().assignee(assignee_id), page)
            .await
    }

    pub async fn get_comments(&self, id: i64) -> TaskResult<Vec<Comment>> {
        self.load(id).await?;
        Ok(self.store.comments(id).await?)
    }

    /// Tasks matching every present criterion of `filter`
    pub async fn get_all(&self, filter: TaskFilter, page: PageRequest) -> TaskResult<Page<Task>> {
        Ok(self.store.query(&filter, &page).await?)
    }
}

fn require_title(title: &str) -> TaskResult<()> {
    if title.trim().is_empty() {
        return Err(TaskError::InvalidArgument(
            "Task title cannot be blank".to_string(),
        ));
    }
    Ok(())
}

fn comment_content(comment: Option<NewComment>) -> TaskResult<String> {
    match comment {
        Some(comment) if !comment.content.trim().is_empty() => Ok(comment.content),
        _ => Err(TaskError::InvalidArgument(
            "Comment cannot be null".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryTaskStore;
    use common::{
        identity::Role,
        users::{InMemoryUserDirectory, NewUser},
    };

    async fn service() -> (TaskService<InMemoryTaskStore, InMemoryUserDirectory>, Caller) {
        let users = InMemoryUserDirectory::new();
        let admin = users
            .create(&NewUser {
                username: "admin".to_string(),
                password_hash: "hash".to_string(),
                full_name: "Admin".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        (
            TaskService::new(InMemoryTaskStore::new(), users),
            Caller::new(admin.id, admin.username, Role::Admin),
        )
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn create_sets_caller_as_author() {
        let (service, admin) = service().await;
        let task = service.create_task(&admin, new_task("Plan")).await.unwrap();

        assert_eq!(task.author_id, admin.id);
        assert_eq!(service.get_by_id(task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn create_rejects_blank_title_and_users() {
        let (service, admin) = service().await;

        let blank = service.create_task(&admin, new_task("   ")).await;
        assert!(matches!(blank, Err(TaskError::InvalidArgument(_))));

        let user = Caller::new(admin.id, "admin", Role::User);
        let denied = service.create_task(&user, new_task("Plan")).await;
        assert!(matches!(denied, Err(TaskError::AuthorizationDenied(_))));
    }

    #[tokio::test]
    async fn create_with_unknown_assignee_persists_nothing() {
        let (service, admin) = service().await;
        let mut payload = new_task("Plan");
        payload.assignee_id = Some(99);

        let result = service.create_task(&admin, payload).await;
        assert!(matches!(result, Err(TaskError::NotFound { entity: "User", id: 99 })));

        let page = service
            .get_all(TaskFilter::new(), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn blank_comment_fails_before_task_lookup() {
        let (service, admin) = service().await;

        let missing = service.add_comment(&admin, 404, None).await;
        assert!(matches!(missing, Err(TaskError::InvalidArgument(_))));

        let blank = service
            .add_comment(&admin, 404, Some(NewComment { content: " ".to_string() }))
            .await;
        assert!(matches!(blank, Err(TaskError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn update_replaces_optional_fields() {
        let (service, admin) = service().await;
        let mut payload = new_task("Plan");
        payload.description = Some("draft".to_string());
        payload.assignee_id = Some(admin.id);
        let task = service.create_task(&admin, payload).await.unwrap();

        let updated = service
            .update_task(
                &admin,
                task.id,
                TaskUpdate {
                    title: "Plan v2".to_string(),
                    description: None,
                    status: TaskStatus::InProgress,
                    priority: TaskPriority::High,
                    author_id: admin.id,
                    assignee_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Plan v2");
        assert_eq!(updated.description, None);
        assert_eq!(updated.assignee_id, None);
        assert_eq!(updated.version, task.version + 1);
    }
}
