#![allow(dead_code)]

use common::{
    identity::{Caller, Claims, Role, TokenType},
    users::{InMemoryUserDirectory, NewUser, UserDirectory},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use std::time::{SystemTime, UNIX_EPOCH};
use tasks::{
    models::{NewTask, Page, Task, TaskDraft, TaskPriority, TaskStatus},
    repositories::{InMemoryTaskStore, TaskStore},
    service::TaskService,
};
use uuid::Uuid;

pub const PRIVATE_KEY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../fixtures/jwt_test_private.pem"
));
pub const PUBLIC_KEY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../fixtures/jwt_test_public.pem"
));

pub type MemoryService = TaskService<InMemoryTaskStore, InMemoryUserDirectory>;

/// Directory holding an admin with id 1 followed by `users` plain users
/// with ids 2..=users + 1
pub async fn directory(users: usize) -> InMemoryUserDirectory {
    let directory = InMemoryUserDirectory::new();
    add_user(&directory, "admin", Role::Admin).await;
    for n in 0..users {
        add_user(&directory, &format!("user_{}", n + 2), Role::User).await;
    }
    directory
}

async fn add_user(directory: &InMemoryUserDirectory, username: &str, role: Role) {
    directory
        .create(&NewUser {
            username: username.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            full_name: username.to_string(),
            role,
        })
        .await
        .unwrap();
}

pub async fn service(users: usize) -> MemoryService {
    TaskService::new(InMemoryTaskStore::new(), directory(users).await)
}

pub fn admin() -> Caller {
    Caller::new(1, "admin", Role::Admin)
}

pub fn user(id: i64) -> Caller {
    Caller::new(id, format!("user_{}", id), Role::User)
}

pub fn new_task(title: &str, assignee_id: Option<i64>) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: Some(format!("{} description", title)),
        status: TaskStatus::Todo,
        priority: TaskPriority::Medium,
        assignee_id,
    }
}

/// Insert a task with an arbitrary author, bypassing the admin check
pub async fn seed<S: TaskStore>(
    store: &S,
    status: TaskStatus,
    priority: TaskPriority,
    author_id: i64,
    assignee_id: Option<i64>,
) -> Task {
    store
        .insert(&TaskDraft {
            title: format!("{} {} by {}", status, priority, author_id),
            description: None,
            status,
            priority,
            author_id,
            assignee_id,
        })
        .await
        .unwrap()
}

/// RS256 token signed with the test key pair
pub fn token(caller: &Caller, token_type: TokenType) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: caller.username.clone(),
        uid: caller.id,
        role: caller.role,
        iat: now,
        exp: now + 900,
        jti: Uuid::new_v4(),
        token_type,
    };
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

/// Reference listing: one explicit branch per present/absent combination
pub fn reference(
    tasks: &[Task],
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    author: Option<i64>,
    assignee: Option<i64>,
) -> Vec<i64> {
    tasks
        .iter()
        .filter(|t| match (status, priority, author, assignee) {
            (None, None, None, None) => true,
            (Some(s), None, None, None) => t.status == s,
            (None, Some(p), None, None) => t.priority == p,
            (None, None, Some(a), None) => t.author_id == a,
            (None, None, None, Some(u)) => t.assignee_id == Some(u),
            (Some(s), Some(p), None, None) => t.status == s && t.priority == p,
            (Some(s), None, Some(a), None) => t.status == s && t.author_id == a,
            (Some(s), None, None, Some(u)) => t.status == s && t.assignee_id == Some(u),
            (None, Some(p), Some(a), None) => t.priority == p && t.author_id == a,
            (None, Some(p), None, Some(u)) => t.priority == p && t.assignee_id == Some(u),
            (None, None, Some(a), Some(u)) => t.author_id == a && t.assignee_id == Some(u),
            (Some(s), Some(p), Some(a), None) => {
                t.status == s && t.priority == p && t.author_id == a
            }
            (Some(s), Some(p), None, Some(u)) => {
                t.status == s && t.priority == p && t.assignee_id == Some(u)
            }
            (Some(s), None, Some(a), Some(u)) => {
                t.status == s && t.author_id == a && t.assignee_id == Some(u)
            }
            (None, Some(p), Some(a), Some(u)) => {
                t.priority == p && t.author_id == a && t.assignee_id == Some(u)
            }
            (Some(s), Some(p), Some(a), Some(u)) => {
                t.status == s && t.priority == p && t.author_id == a && t.assignee_id == Some(u)
            }
        })
        .map(|t| t.id)
        .collect()
}

pub fn ids(page: &Page<Task>) -> Vec<i64> {
    page.content.iter().map(|t| t.id).collect()
}
