//! Application state shared by every handler.
//!
//! Repositories are held as trait objects; in production they all point at
//! the same [`SqliteRepository`].

use std::sync::Arc;

use mediverse_auth::AuthState;
use mediverse_core::notify::Mailer;
use mediverse_core::storage::{
    AdminRepository, ApplicationRepository, AppointmentRepository, ChatRepository,
    ContactRepository, RatingRepository, ReportRepository, SlotRepository,
    SpecializationRepository, UserRepository,
};

use crate::{storage::SqliteRepository, uploads::UploadStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub specializations: Arc<dyn SpecializationRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub slots: Arc<dyn SlotRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub contact: Arc<dyn ContactRepository>,
    pub admin: Arc<dyn AdminRepository>,
    /// Sessions and cookie settings; its `users` is the same repository.
    pub auth: AuthState,
    pub mailer: Arc<dyn Mailer>,
    pub uploads: UploadStore,
}

impl AppState {
    /// Wires every repository trait to one SQLite repository.
    pub fn new(
        repo: SqliteRepository,
        auth: AuthState,
        mailer: Arc<dyn Mailer>,
        uploads: UploadStore,
    ) -> Self {
        let repo = Arc::new(repo);

        Self {
            users: repo.clone(),
            specializations: repo.clone(),
            applications: repo.clone(),
            slots: repo.clone(),
            appointments: repo.clone(),
            reports: repo.clone(),
            ratings: repo.clone(),
            chats: repo.clone(),
            contact: repo.clone(),
            admin: repo,
            auth,
            mailer,
            uploads,
        }
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
