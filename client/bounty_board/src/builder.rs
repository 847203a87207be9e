//! Transaction builder: turns one validated user intent into a composed,
//! unsigned [`ProgrammableTransaction`].
//!
//! The builder performs no I/O. Inputs are checked before anything is
//! composed; a rejected intent never yields a partial transaction.
//! Decimal reward amounts become base units here and nowhere else.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::address::{Address, CLOCK_OBJECT_ID};
use crate::amount::parse_base_units;
use crate::config::NetworkConfig;
use crate::errors::{BoardError, Result};
use crate::models::{ReviewDecision, Role};
use crate::registry::ContractFunction;
use crate::tx::{ProgrammableTransaction, PureArg};

/// Everything needed to create a task on a board.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub board: String,
    pub name: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub max_completions: u64,
    /// Decimal coin amount as entered, e.g. `"0.5"`.
    pub reward_amount: String,
    pub allow_self_review: bool,
    /// Opaque task configuration passed through to the contract.
    pub config: String,
}

#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    package: Address,
    portal: Option<Address>,
}

impl TransactionBuilder {
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        Ok(Self {
            package: network.require_package()?,
            portal: network.portal_id,
        })
    }

    pub fn create_profile(
        &self,
        username: &str,
        email: &str,
        role: &str,
        bio: &str,
    ) -> Result<ProgrammableTransaction> {
        required("username", username)?;
        required("email", email)?;
        required("bio", bio)?;
        let role: Role = role.parse()?;
        let portal = self.portal()?;

        let mut tx = ProgrammableTransaction::new();
        let args = vec![
            tx.object(portal),
            tx.pure(PureArg::String(username.to_string())),
            tx.pure(PureArg::String(email.to_string())),
            tx.pure(PureArg::String(role.as_str().to_string())),
            tx.pure(PureArg::String(bio.to_string())),
            tx.object(CLOCK_OBJECT_ID),
        ];
        self.finish(tx, ContractFunction::CreateUserProfile, args)
    }

    /// Create a board funded with `reward_amount` coins split off the gas coin.
    pub fn create_board(
        &self,
        name: &str,
        description: &str,
        image_url: Option<&str>,
        reward_amount: &str,
    ) -> Result<ProgrammableTransaction> {
        required("name", name)?;
        required("description", description)?;
        let amount = parse_base_units(reward_amount)?;
        let portal = self.portal()?;

        let mut tx = ProgrammableTransaction::new();
        let funding = tx.split_gas(&[amount]);
        let mut args = vec![
            tx.object(portal),
            tx.pure(PureArg::String(name.to_string())),
            tx.pure(PureArg::String(description.to_string())),
            tx.pure(PureArg::String(image_url.unwrap_or_default().to_string())),
        ];
        args.extend(funding);
        args.push(tx.object(CLOCK_OBJECT_ID));
        self.finish(tx, ContractFunction::CreateBoard, args)
    }

    pub fn join_board(&self, board: &str) -> Result<ProgrammableTransaction> {
        let board = Address::parse(board)?;
        let portal = self.portal()?;

        let mut tx = ProgrammableTransaction::new();
        let args = vec![tx.object(portal), tx.object(board), tx.object(CLOCK_OBJECT_ID)];
        self.finish(tx, ContractFunction::JoinBoard, args)
    }

    /// Close a board and withdraw its remaining reward funds.
    pub fn close_board(&self, board: &str) -> Result<ProgrammableTransaction> {
        let board = Address::parse(board)?;

        let mut tx = ProgrammableTransaction::new();
        let args = vec![tx.object(board), tx.object(CLOCK_OBJECT_ID)];
        self.finish(tx, ContractFunction::CloseBoard, args)
    }

    pub fn create_task(&self, task: &NewTask) -> Result<ProgrammableTransaction> {
        let board = Address::parse(&task.board)?;
        required("name", &task.name)?;
        required("description", &task.description)?;
        if task.max_completions == 0 {
            return Err(BoardError::validation("max completions must be positive"));
        }
        let deadline_ms = u64::try_from(task.deadline.timestamp_millis())
            .map_err(|_| BoardError::validation("deadline is before the epoch"))?;
        let reward = parse_base_units(&task.reward_amount)?;

        let mut tx = ProgrammableTransaction::new();
        let args = vec![
            tx.object(board),
            tx.pure(PureArg::String(task.name.clone())),
            tx.pure(PureArg::String(task.description.clone())),
            tx.pure(PureArg::U64(deadline_ms)),
            tx.pure(PureArg::U64(task.max_completions)),
            tx.pure(PureArg::U64(reward)),
            tx.pure(PureArg::Bool(task.allow_self_review)),
            tx.pure(PureArg::String(task.config.clone())),
            tx.object(CLOCK_OBJECT_ID),
        ];
        self.finish(tx, ContractFunction::CreateTask, args)
    }

    /// `task_key` is the task's key in the board's task table, not its object id.
    pub fn submit_task_proof(
        &self,
        board: &str,
        task_key: &str,
        proof: &str,
    ) -> Result<ProgrammableTransaction> {
        let board = Address::parse(board)?;
        let task_key = Address::parse(task_key)?;
        required("proof", proof)?;

        let mut tx = ProgrammableTransaction::new();
        let args = vec![
            tx.object(board),
            tx.pure(PureArg::Address(task_key)),
            tx.pure(PureArg::String(proof.to_string())),
            tx.object(CLOCK_OBJECT_ID),
        ];
        self.finish(tx, ContractFunction::SubmitTaskProof, args)
    }

    pub fn review_submission(
        &self,
        board: &str,
        task_key: &str,
        submitter: &str,
        comment: &str,
        decision: ReviewDecision,
    ) -> Result<ProgrammableTransaction> {
        let board = Address::parse(board)?;
        let task_key = Address::parse(task_key)?;
        let submitter = Address::parse(submitter)?;

        let mut tx = ProgrammableTransaction::new();
        let args = vec![
            tx.object(board),
            tx.pure(PureArg::Address(task_key)),
            tx.pure(PureArg::Address(submitter)),
            tx.pure(PureArg::String(comment.to_string())),
            tx.pure(PureArg::U64(decision.to_wire_code())),
            tx.object(CLOCK_OBJECT_ID),
        ];
        self.finish(tx, ContractFunction::ReviewSubmission, args)
    }

    pub fn add_reviewers(
        &self,
        board: &str,
        task_key: &str,
        reviewers: &[String],
    ) -> Result<ProgrammableTransaction> {
        let board = Address::parse(board)?;
        let task_key = Address::parse(task_key)?;
        if reviewers.is_empty() {
            return Err(BoardError::validation("at least one reviewer is required"));
        }
        let reviewers = reviewers
            .iter()
            .map(|r| Address::parse(r))
            .collect::<Result<Vec<_>>>()?;

        let mut tx = ProgrammableTransaction::new();
        let args = vec![
            tx.object(board),
            tx.pure(PureArg::Address(task_key)),
            tx.pure(PureArg::AddressVec(reviewers)),
        ];
        self.finish(tx, ContractFunction::AddReviewer, args)
    }

    fn portal(&self) -> Result<Address> {
        self.portal
            .ok_or_else(|| BoardError::Config("No profile portal configured".to_string()))
    }

    fn finish(
        &self,
        mut tx: ProgrammableTransaction,
        function: ContractFunction,
        args: Vec<crate::tx::Argument>,
    ) -> Result<ProgrammableTransaction> {
        tx.move_call(self.package, function, args);
        info!(
            "Composed {}::{} ({} inputs, {} commands)",
            function.module(),
            function.function(),
            tx.inputs.len(),
            tx.commands.len()
        );
        Ok(tx)
    }
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BoardError::validation(format!("{field} is required")));
    }
    Ok(())
}
