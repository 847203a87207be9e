//! Read models for boards, tasks, submissions and profiles.
//!
//! Each model is a transient projection of a ledger object, decoded from the
//! JSON content the fullnode returns for it. Integer fields are kept in the
//! ledger's units (base units for amounts, milliseconds for timestamps);
//! scaling for display happens only through the `display_*` helpers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::amount::format_base_units;
use crate::errors::{BoardError, Result};
use crate::store::ObjectData;

// ─────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────

/// Lifecycle of a submission as seen by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Approved and rejected submissions never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    fn from_variant(variant: &str) -> Result<Self> {
        match variant {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(BoardError::malformed(format!(
                "unknown submission status: {other}"
            ))),
        }
    }
}

/// Outcome a reviewer assigns to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn to_wire_code(self) -> u64 {
        match self {
            Self::Rejected => 0,
            Self::Approved => 1,
        }
    }

    pub fn from_wire_code(code: u64) -> Result<Self> {
        match code {
            0 => Ok(Self::Rejected),
            1 => Ok(Self::Approved),
            other => Err(BoardError::validation(format!(
                "review status code must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl From<ReviewDecision> for SubmissionStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => Self::Approved,
            ReviewDecision::Rejected => Self::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    Student,
    Designer,
    Researcher,
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::Student => "student",
            Self::Designer => "designer",
            Self::Researcher => "researcher",
            Self::Other => "other",
        }
    }
}

impl FromStr for Role {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "developer" => Ok(Self::Developer),
            "student" => Ok(Self::Student),
            "designer" => Ok(Self::Designer),
            "researcher" => Ok(Self::Researcher),
            "other" => Ok(Self::Other),
            other => Err(BoardError::validation(format!("unknown role: {other}"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────
// Read models
// ─────────────────────────────────────────────────────────

/// Handle to a nested keyed collection (a `Table` on the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHandle {
    pub id: Address,
    /// Declared entry count at read time.
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    pub id: Address,
    pub creator: Address,
    pub name: String,
    pub description: String,
    pub img_url: String,
    pub tasks: TableHandle,
    /// Base units.
    pub total_pledged: u64,
    pub members: Vec<Address>,
    pub created_at_ms: u64,
    pub closed: bool,
}

impl Board {
    pub fn display_pledged(&self) -> String {
        format_base_units(self.total_pledged)
    }

    pub fn is_member(&self, who: &Address) -> bool {
        self.members.contains(who)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Key under which the task is indexed in its board's task table.
    pub task_address: Address,
    /// Storage identity of the task's field object.
    pub object_id: Address,
    pub name: String,
    pub creator: Address,
    pub description: String,
    pub deadline_ms: u64,
    pub max_completions: u64,
    pub reviewers: Vec<Address>,
    pub submissions: TableHandle,
    pub completed: bool,
    /// Base units.
    pub reward_amount: u64,
    pub created_at_ms: u64,
    pub cancelled: bool,
    pub config: String,
    pub allow_self_review: bool,
}

impl Task {
    /// Display-only; the contract enforces deadlines itself.
    /// Deadlines beyond the representable range never pass.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        i64::try_from(self.deadline_ms).is_ok_and(|deadline| now.timestamp_millis() > deadline)
    }

    pub fn display_reward(&self) -> String {
        format_base_units(self.reward_amount)
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.deadline_ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub id: Address,
    pub task_id: Address,
    pub submitter: Address,
    pub proof: String,
    pub status: SubmissionStatus,
    pub submitted_at_ms: u64,
    pub review_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Address,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub user_address: Address,
    pub created_boards: Vec<Address>,
    pub joined_boards: Vec<Address>,
    pub created_at_ms: u64,
}

/// Historical record of a board's creation, used for the board listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardCreatedEvent {
    pub board_id: Address,
    pub name: String,
    pub description: String,
    pub reward_token_type: String,
    /// Base units.
    pub reward_token_amount: u64,
    pub created_at_ms: u64,
}

/// An object owned by an account; `balance` is set for coin objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedObject {
    pub id: Address,
    pub object_type: String,
    pub balance: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Ledger JSON shapes
// ─────────────────────────────────────────────────────────

fn de_u64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Str(String),
    }
    match Repr::deserialize(d)? {
        Repr::Num(n) => Ok(n),
        Repr::Str(s) => s.parse().map_err(de::Error::custom),
    }
}

/// Address lists arrive either as plain vectors or wrapped in a `VecSet`.
fn de_addresses<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<Address>, D::Error> {
    #[derive(Deserialize)]
    struct SetFields {
        contents: Vec<Address>,
    }
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<Address>),
        Set { fields: SetFields },
    }
    Ok(match Repr::deserialize(d)? {
        Repr::List(v) => v,
        Repr::Set { fields } => fields.contents,
    })
}

#[derive(Deserialize)]
struct Uid {
    id: Address,
}

#[derive(Deserialize)]
struct MoveStruct<T> {
    fields: T,
}

#[derive(Deserialize)]
struct RawTable {
    id: Uid,
    #[serde(deserialize_with = "de_u64")]
    size: u64,
}

impl From<MoveStruct<RawTable>> for TableHandle {
    fn from(t: MoveStruct<RawTable>) -> Self {
        TableHandle {
            id: t.fields.id.id,
            size: t.fields.size,
        }
    }
}

/// Dynamic-field wrapper `Field<K, V>` around a collection item.
#[derive(Deserialize)]
struct RawField<K, V> {
    id: Uid,
    name: K,
    value: MoveStruct<V>,
}

#[derive(Deserialize)]
struct RawBoard {
    id: Uid,
    creator: Address,
    name: String,
    description: String,
    #[serde(default)]
    img_url: String,
    tasks: MoveStruct<RawTable>,
    #[serde(deserialize_with = "de_u64")]
    total_pledged: u64,
    #[serde(deserialize_with = "de_addresses")]
    members: Vec<Address>,
    #[serde(deserialize_with = "de_u64")]
    created_at: u64,
    closed: bool,
}

#[derive(Deserialize)]
struct RawTask {
    name: String,
    creator: Address,
    description: String,
    #[serde(deserialize_with = "de_u64")]
    deadline: u64,
    #[serde(deserialize_with = "de_u64")]
    max_completions: u64,
    #[serde(deserialize_with = "de_addresses")]
    reviewers: Vec<Address>,
    submissions: MoveStruct<RawTable>,
    completed: bool,
    #[serde(rename = "rewardAmount", alias = "reward_amount", deserialize_with = "de_u64")]
    reward_amount: u64,
    #[serde(deserialize_with = "de_u64")]
    created_at: u64,
    cancelled: bool,
    #[serde(default)]
    config: String,
    allow_self_check: bool,
}

#[derive(Deserialize)]
struct Variant {
    variant: String,
}

#[derive(Deserialize)]
struct RawSubmission {
    id: Uid,
    task_id: Address,
    submitter: Address,
    proof: String,
    status: Variant,
    #[serde(deserialize_with = "de_u64")]
    submitted_at: u64,
    #[serde(default)]
    review_comment: Option<String>,
}

#[derive(Deserialize)]
struct RawProfile {
    username: String,
    email: String,
    role: String,
    bio: String,
    user_address: Address,
    #[serde(deserialize_with = "de_addresses")]
    created_boards: Vec<Address>,
    #[serde(deserialize_with = "de_addresses")]
    join_boards: Vec<Address>,
    #[serde(deserialize_with = "de_u64")]
    created_at: u64,
}

#[derive(Deserialize)]
struct TypeName {
    name: String,
}

#[derive(Deserialize)]
struct RawBoardCreated {
    board_id: Address,
    name: String,
    description: String,
    reward_token_type: TypeName,
    #[serde(deserialize_with = "de_u64")]
    reward_token_amount: u64,
    #[serde(deserialize_with = "de_u64")]
    created_at: u64,
}

#[derive(Deserialize)]
struct CoinFields {
    #[serde(deserialize_with = "de_u64")]
    balance: u64,
}

/// Decode the `fields` of a Move object's parsed content.
fn decode_fields<T: DeserializeOwned>(content: &Value, what: &str) -> Result<T> {
    let fields = content
        .get("fields")
        .ok_or_else(|| BoardError::malformed(format!("{what} content has no fields")))?;
    serde_json::from_value(fields.clone())
        .map_err(|e| BoardError::malformed(format!("{what}: {e}")))
}

// ─────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────

impl Board {
    pub fn from_content(content: &Value) -> Result<Self> {
        let raw: RawBoard = decode_fields(content, "board")?;
        Ok(Board {
            id: raw.id.id,
            creator: raw.creator,
            name: raw.name,
            description: raw.description,
            img_url: raw.img_url,
            tasks: raw.tasks.into(),
            total_pledged: raw.total_pledged,
            members: raw.members,
            created_at_ms: raw.created_at,
            closed: raw.closed,
        })
    }
}

impl Task {
    /// Decode a task's field object. The key and storage identity come from
    /// the wrapper itself.
    pub fn from_content(content: &Value) -> Result<Self> {
        let raw: RawField<Address, RawTask> = decode_fields(content, "task")?;
        let t = raw.value.fields;
        Ok(Task {
            task_address: raw.name,
            object_id: raw.id.id,
            name: t.name,
            creator: t.creator,
            description: t.description,
            deadline_ms: t.deadline,
            max_completions: t.max_completions,
            reviewers: t.reviewers,
            submissions: t.submissions.into(),
            completed: t.completed,
            reward_amount: t.reward_amount,
            created_at_ms: t.created_at,
            cancelled: t.cancelled,
            config: t.config,
            allow_self_review: t.allow_self_check,
        })
    }
}

impl Submission {
    pub fn from_content(content: &Value) -> Result<Self> {
        let raw: RawField<Value, RawSubmission> = decode_fields(content, "submission")?;
        let s = raw.value.fields;
        Ok(Submission {
            id: s.id.id,
            task_id: s.task_id,
            submitter: s.submitter,
            proof: s.proof,
            status: SubmissionStatus::from_variant(&s.status.variant)?,
            submitted_at_ms: s.submitted_at,
            review_comment: s.review_comment.filter(|c| !c.is_empty()),
        })
    }
}

impl Profile {
    pub fn from_content(content: &Value) -> Result<Self> {
        let raw: RawField<Value, RawProfile> = decode_fields(content, "profile")?;
        let p = raw.value.fields;
        let role = p
            .role
            .parse()
            .map_err(|_| BoardError::malformed(format!("profile has unknown role {}", p.role)))?;
        Ok(Profile {
            id: raw.id.id,
            username: p.username,
            email: p.email,
            role,
            bio: p.bio,
            user_address: p.user_address,
            created_boards: p.created_boards,
            joined_boards: p.join_boards,
            created_at_ms: p.created_at,
        })
    }
}

impl BoardCreatedEvent {
    pub fn from_parsed_json(parsed: &Value) -> Result<Self> {
        let raw: RawBoardCreated = serde_json::from_value(parsed.clone())
            .map_err(|e| BoardError::malformed(format!("board created event: {e}")))?;
        Ok(BoardCreatedEvent {
            board_id: raw.board_id,
            name: raw.name,
            description: raw.description,
            reward_token_type: raw.reward_token_type.name,
            reward_token_amount: raw.reward_token_amount,
            created_at_ms: raw.created_at,
        })
    }
}

impl From<ObjectData> for OwnedObject {
    fn from(data: ObjectData) -> Self {
        let balance = data
            .content
            .as_ref()
            .filter(|c| c.get("dataType").and_then(Value::as_str) == Some("moveObject"))
            .and_then(|c| decode_fields::<CoinFields>(c, "coin").ok())
            .map(|c| c.balance);
        OwnedObject {
            id: data.object_id,
            object_type: data.object_type.unwrap_or_default(),
            balance,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn board(id: &str, tasks_table: &str, task_count: u64) -> Value {
        json!({
            "dataType": "moveObject",
            "type": "0xa::bountyboard::BountyBoard<0x2::sui::SUI>",
            "fields": {
                "id": { "id": id },
                "creator": "0xc0",
                "name": "Rust bounties",
                "description": "Bounties for the Rust port",
                "img_url": "https://example.com/b.png",
                "tasks": {
                    "type": "0x2::table::Table<address, 0xa::bountyboard::Task>",
                    "fields": { "id": { "id": tasks_table }, "size": task_count.to_string() }
                },
                "total_pledged": "1500000000",
                "members": ["0xc0", "0xc1"],
                "created_at": "1700000000000",
                "closed": false
            }
        })
    }

    pub fn task(object_id: &str, key: &str, name: &str, submissions_table: &str) -> Value {
        json!({
            "dataType": "moveObject",
            "fields": {
                "id": { "id": object_id },
                "name": key,
                "value": {
                    "type": "0xa::bountyboard::Task",
                    "fields": {
                        "name": name,
                        "creator": "0xc0",
                        "description": "Fix the null pointer issue",
                        "deadline": "1800000000000",
                        "max_completions": "3",
                        "reviewers": ["0xc0"],
                        "submissions": {
                            "type": "0x2::table::Table<address, 0xa::bountyboard::Submission>",
                            "fields": { "id": { "id": submissions_table }, "size": "0" }
                        },
                        "completed": false,
                        "rewardAmount": "500000000",
                        "created_at": "1700000000001",
                        "cancelled": false,
                        "config": "test_config",
                        "allow_self_check": false
                    }
                }
            }
        })
    }

    pub fn submission(field_id: &str, submitter: &str, status: &str) -> Value {
        json!({
            "dataType": "moveObject",
            "fields": {
                "id": { "id": field_id },
                "name": submitter,
                "value": {
                    "type": "0xa::bountyboard::Submission",
                    "fields": {
                        "id": { "id": format!("{field_id}ff") },
                        "task_id": "0xd1",
                        "submitter": submitter,
                        "proof": "https://github.com/pr/1",
                        "status": { "variant": status, "fields": {} },
                        "submitted_at": 1700000000500u64,
                        "review_comment": null
                    }
                }
            }
        })
    }

    pub fn profile(id: &str, role: &str) -> Value {
        json!({
            "dataType": "moveObject",
            "fields": {
                "id": { "id": id },
                "name": "0xc0",
                "value": {
                    "type": "0xa::UserProfilePortal::UserProfile",
                    "fields": {
                        "username": "ferris",
                        "email": "ferris@example.com",
                        "role": role,
                        "bio": "Writes a lot of Rust",
                        "user_address": "0xc0",
                        "created_boards": ["0xb1"],
                        "join_boards": [],
                        "created_at": "1700000000000"
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn decode_board() {
        let board = Board::from_content(&fixtures::board("0xb1", "0xa1", 2)).unwrap();
        assert_eq!(board.id, addr("0xb1"));
        assert_eq!(board.tasks, TableHandle { id: addr("0xa1"), size: 2 });
        assert_eq!(board.total_pledged, 1_500_000_000);
        assert_eq!(board.display_pledged(), "1.5");
        assert!(board.is_member(&addr("0xc1")));
        assert!(!board.closed);
    }

    #[test]
    fn board_members_as_vec_set() {
        let mut content = fixtures::board("0xb1", "0xa1", 0);
        content["fields"]["members"] = json!({
            "type": "0x2::vec_set::VecSet<address>",
            "fields": { "contents": ["0xc5"] }
        });
        let board = Board::from_content(&content).unwrap();
        assert_eq!(board.members, vec![addr("0xc5")]);
    }

    #[test]
    fn board_without_fields_is_malformed() {
        let err = Board::from_content(&json!({ "dataType": "package" })).unwrap_err();
        assert!(matches!(err, BoardError::MalformedData(_)));
    }

    #[test]
    fn board_with_wrong_shape_is_malformed() {
        let mut content = fixtures::board("0xb1", "0xa1", 0);
        content["fields"]["total_pledged"] = json!("lots");
        assert!(matches!(
            Board::from_content(&content),
            Err(BoardError::MalformedData(_))
        ));
    }

    #[test]
    fn decode_task_from_field_wrapper() {
        let task = Task::from_content(&fixtures::task("0xd1", "0xe1", "Fix bug", "0xf1")).unwrap();
        assert_eq!(task.object_id, addr("0xd1"));
        assert_eq!(task.task_address, addr("0xe1"));
        assert_eq!(task.reward_amount, 500_000_000);
        assert_eq!(task.display_reward(), "0.5");
        assert_eq!(task.submissions.id, addr("0xf1"));
        assert!(!task.allow_self_review);
        assert_eq!(task.config, "test_config");
    }

    #[test]
    fn task_deadline_is_display_only() {
        let task = Task::from_content(&fixtures::task("0xd1", "0xe1", "t", "0xf1")).unwrap();
        let before = DateTime::from_timestamp_millis(1_799_999_999_999).unwrap();
        let after = DateTime::from_timestamp_millis(1_800_000_000_001).unwrap();
        assert!(!task.is_past_deadline(before));
        assert!(task.is_past_deadline(after));
        assert_eq!(task.deadline().unwrap().timestamp_millis(), 1_800_000_000_000);
    }

    #[test]
    fn out_of_range_deadline_never_passes() {
        let mut task = Task::from_content(&fixtures::task("0xd1", "0xe1", "t", "0xf1")).unwrap();
        task.deadline_ms = u64::MAX;
        assert!(!task.is_past_deadline(Utc::now()));
        assert!(task.deadline().is_none());
    }

    #[test]
    fn decode_submission_statuses() {
        for (variant, expected) in [
            ("Pending", SubmissionStatus::Pending),
            ("Approved", SubmissionStatus::Approved),
            ("Rejected", SubmissionStatus::Rejected),
        ] {
            let sub = Submission::from_content(&fixtures::submission("0x51", "0xc2", variant)).unwrap();
            assert_eq!(sub.status, expected);
            assert_eq!(sub.submitter, addr("0xc2"));
            assert_eq!(sub.review_comment, None);
        }
        assert!(matches!(
            Submission::from_content(&fixtures::submission("0x51", "0xc2", "Escalated")),
            Err(BoardError::MalformedData(_))
        ));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(SubmissionStatus::Approved.is_terminal());
        assert!(SubmissionStatus::Rejected.is_terminal());
    }

    #[test]
    fn review_decision_wire_codes() {
        assert_eq!(ReviewDecision::Approved.to_wire_code(), 1);
        assert_eq!(ReviewDecision::Rejected.to_wire_code(), 0);
        assert_eq!(ReviewDecision::from_wire_code(1).unwrap(), ReviewDecision::Approved);
        assert_eq!(ReviewDecision::from_wire_code(0).unwrap(), ReviewDecision::Rejected);
        assert!(ReviewDecision::from_wire_code(2).is_err());
        assert_eq!(
            SubmissionStatus::from(ReviewDecision::Approved),
            SubmissionStatus::Approved
        );
    }

    #[test]
    fn decode_profile_and_role() {
        let profile = Profile::from_content(&fixtures::profile("0x77", "researcher")).unwrap();
        assert_eq!(profile.id, addr("0x77"));
        assert_eq!(profile.role, Role::Researcher);
        assert_eq!(profile.created_boards, vec![addr("0xb1")]);
        assert!(profile.joined_boards.is_empty());

        assert!(matches!(
            Profile::from_content(&fixtures::profile("0x77", "wizard")),
            Err(BoardError::MalformedData(_))
        ));
    }

    #[test]
    fn decode_board_created_event() {
        let ev = BoardCreatedEvent::from_parsed_json(&json!({
            "board_id": "0xb1",
            "name": "Rust bounties",
            "description": "Bounties for the Rust port",
            "reward_token_type": { "name": "0000000000000000000000000000000000000000000000000000000000000002::sui::SUI" },
            "reward_token_amount": "2000000000",
            "created_at": "1700000000000"
        }))
        .unwrap();
        assert_eq!(ev.board_id, addr("0xb1"));
        assert_eq!(ev.reward_token_amount, 2_000_000_000);
        assert!(ev.reward_token_type.ends_with("::sui::SUI"));
    }

    #[test]
    fn owned_coin_has_balance() {
        let coin = ObjectData {
            object_id: addr("0x99"),
            object_type: Some("0x2::coin::Coin<0x2::sui::SUI>".into()),
            content: Some(json!({
                "dataType": "moveObject",
                "fields": { "id": { "id": "0x99" }, "balance": "42" }
            })),
        };
        let owned = OwnedObject::from(coin);
        assert_eq!(owned.balance, Some(42));

        let nft = ObjectData {
            object_id: addr("0x98"),
            object_type: Some("0xa::nft::Badge".into()),
            content: Some(json!({ "dataType": "moveObject", "fields": { "id": { "id": "0x98" } } })),
        };
        assert_eq!(OwnedObject::from(nft).balance, None);
    }

    #[test]
    fn role_parsing() {
        assert_eq!("designer".parse::<Role>().unwrap(), Role::Designer);
        assert!(matches!("Designer".parse::<Role>(), Err(BoardError::Validation(_))));
    }
}
