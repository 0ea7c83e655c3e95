use super::actions::{UserAction, UserActionResult};
use super::error::UserError;
use crate::actor_framework::Entity;
use crate::domain::{ChatBlock, User, UserCreate, UserPatch};

fn validate_email(email: &str) -> Result<(), UserError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(UserError::ValidationError(format!("Invalid email: {}", email))),
    }
}

impl Entity for User {
    type Id = String;
    type CreateParams = UserCreate;
    type UpdateParams = UserPatch;
    type Action = UserAction;
    type ActionResult = UserActionResult;
    type Error = UserError;

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, params: UserCreate) -> Result<Self, UserError> {
        if params.name.trim().is_empty() {
            return Err(UserError::ValidationError("Name required".to_string()));
        }
        validate_email(&params.email)?;
        Ok(Self {
            id,
            name: params.name,
            email: params.email.trim().to_string(),
            role: params.role,
            loyalty_points: 0,
            chat_block: None,
        })
    }

    fn on_update(&mut self, patch: UserPatch) -> Result<(), UserError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            validate_email(&email)?;
            self.email = email.trim().to_string();
        }
        Ok(())
    }

    fn handle_action(&mut self, action: UserAction) -> Result<UserActionResult, UserError> {
        match action {
            UserAction::AwardPoints(points) => {
                self.loyalty_points = self.loyalty_points.saturating_add(points);
                Ok(UserActionResult::Points(self.loyalty_points))
            }
            UserAction::BlockChat { reason, at } => {
                if self.chat_block.is_some() {
                    return Ok(UserActionResult::ChatBlockChanged(false));
                }
                self.chat_block = Some(ChatBlock { reason, blocked_at: at });
                Ok(UserActionResult::ChatBlockChanged(true))
            }
            UserAction::UnblockChat => Ok(UserActionResult::ChatBlockChanged(self.chat_block.take().is_some())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn customer() -> User {
        User::from_create_params(
            "user_1".into(),
            UserCreate { name: "Lan".into(), email: " lan@bloomie.vn ".into(), role: Role::Customer },
        )
        .unwrap()
    }

    #[test]
    fn emails_are_trimmed_and_checked() {
        assert_eq!(customer().email, "lan@bloomie.vn");
        let err = User::from_create_params(
            "user_2".into(),
            UserCreate { name: "Minh".into(), email: "minh-at-bloomie".into(), role: Role::Staff },
        )
        .unwrap_err();
        assert!(matches!(err, UserError::ValidationError(_)));
    }

    #[test]
    fn chat_block_keeps_first_reason() {
        let mut user = customer();
        let at = chrono::Utc::now();
        assert_eq!(
            user.handle_action(UserAction::BlockChat { reason: "spam".into(), at }).unwrap(),
            UserActionResult::ChatBlockChanged(true)
        );
        assert_eq!(
            user.handle_action(UserAction::BlockChat { reason: "again".into(), at }).unwrap(),
            UserActionResult::ChatBlockChanged(false)
        );
        assert_eq!(user.chat_block.as_ref().unwrap().reason, "spam");
        assert_eq!(
            user.handle_action(UserAction::UnblockChat).unwrap(),
            UserActionResult::ChatBlockChanged(true)
        );
        assert!(!user.is_chat_blocked());
    }
}
