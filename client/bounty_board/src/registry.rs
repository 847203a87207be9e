//! Fixed identities of the on-chain modules, functions and events this
//! client talks to.

use crate::address::Address;

pub const BOUNTY_BOARD_MODULE: &str = "bountyboard";
pub const PROFILE_PORTAL_MODULE: &str = "UserProfilePortal";

/// Reward coin type used as the board's type argument.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

pub const BOARD_CREATED_EVENT: &str = "BoardCreatedEvent";

/// Every contract entry point the builder can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFunction {
    CreateUserProfile,
    CreateBoard,
    JoinBoard,
    CloseBoard,
    CreateTask,
    SubmitTaskProof,
    ReviewSubmission,
    AddReviewer,
}

impl ContractFunction {
    pub fn module(&self) -> &'static str {
        match self {
            Self::CreateUserProfile => PROFILE_PORTAL_MODULE,
            _ => BOUNTY_BOARD_MODULE,
        }
    }

    pub fn function(&self) -> &'static str {
        match self {
            Self::CreateUserProfile => "create_user_profile",
            Self::CreateBoard => "create_board",
            Self::JoinBoard => "join_board",
            Self::CloseBoard => "withdraw_reward_token_and_close_board",
            Self::CreateTask => "create_task",
            Self::SubmitTaskProof => "submit_task_proof",
            Self::ReviewSubmission => "review_submission",
            Self::AddReviewer => "add_reviewer",
        }
    }

    /// Board functions are generic over the reward coin.
    pub fn type_arguments(&self) -> Vec<String> {
        match self {
            Self::CreateUserProfile => Vec::new(),
            _ => vec![SUI_COIN_TYPE.to_string()],
        }
    }
}

/// Fully qualified event type for board creation under `package`.
pub fn board_created_event_type(package: &Address) -> String {
    format!("{package}::{BOUNTY_BOARD_MODULE}::{BOARD_CREATED_EVENT}<{SUI_COIN_TYPE}>")
}
