//! Notificaciones al usuario. `Warning` no interrumpe la sesión; `Blocking`
//! requiere atención antes de reintentar.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Blocking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info,
               message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning,
               message: message.into() }
    }

    pub fn blocking(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Blocking,
               message: message.into() }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Envía las notificaciones al log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("notice: {}", notice.message),
            NoticeLevel::Warning => warn!("notice: {}", notice.message),
            NoticeLevel::Blocking => error!("notice: {}", notice.message),
        }
    }
}

/// Acumula notificaciones para que la UI (o un test) las consuma.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> { self.notices.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Devuelve y vacía las notificaciones pendientes.
    pub fn take(&self) -> Vec<Notice> { std::mem::take(&mut *self.lock()) }

    pub fn snapshot(&self) -> Vec<Notice> { self.lock().clone() }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) { self.lock().push(notice); }
}
