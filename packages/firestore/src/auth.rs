//! App/token binding consumed by the engine.
//!
//! Token acquisition and refresh live elsewhere; the engine only asks for the
//! current token when it dispatches.

use std::cell::RefCell;
use std::rc::Rc;

/// Credentials of an initialized app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppToken {
    pub app_id: u32,
    pub token: String,
    /// Project used when a request does not name one.
    pub project_id: String,
}

impl AppToken {
    pub fn new(app_id: u32, token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            app_id,
            token: token.into(),
            project_id: project_id.into(),
        }
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Source of the current app token.
pub trait AuthProvider {
    /// `None` when no app is bound (never initialized or torn down).
    fn app_token(&self) -> Option<AppToken>;
}

impl AuthProvider for AppToken {
    fn app_token(&self) -> Option<AppToken> {
        Some(self.clone())
    }
}

/// Shared handle to an app's token that can be refreshed or torn down after
/// it was handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct AppBinding {
    token: Rc<RefCell<Option<AppToken>>>,
}

impl AppBinding {
    pub fn new(token: AppToken) -> Self {
        Self {
            token: Rc::new(RefCell::new(Some(token))),
        }
    }

    pub fn set_token(&self, token: AppToken) {
        *self.token.borrow_mut() = Some(token);
    }

    /// Tear the app down; later dispatches fail with `AppNotAssigned`.
    pub fn deinit(&self) {
        self.token.borrow_mut().take();
    }

    pub fn is_ready(&self) -> bool {
        self.token.borrow().is_some()
    }
}

impl AuthProvider for AppBinding {
    fn app_token(&self) -> Option<AppToken> {
        self.token.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_follows_refresh_and_deinit() {
        let binding = AppBinding::new(AppToken::new(1, "t1", "proj"));
        let engine_side = binding.clone();
        assert_eq!(engine_side.app_token().unwrap().token, "t1");

        binding.set_token(AppToken::new(1, "t2", "proj"));
        assert_eq!(engine_side.app_token().unwrap().authorization(), "Bearer t2");

        binding.deinit();
        assert!(!engine_side.is_ready());
        assert!(engine_side.app_token().is_none());
    }

    #[test]
    fn default_binding_is_unassigned() {
        assert!(AppBinding::default().app_token().is_none());
    }
}
