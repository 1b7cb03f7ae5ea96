use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

pub type MemberId = String;
pub type GroupId = String;

/// A participant identity. Owned by the member directory; the ledger only
/// reads it for membership checks.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A named collection of members who share expenses. Membership never
/// changes through the ledger engine.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Member>,
}

impl Group {
    pub fn has_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m.id == member_id)
    }
}

/// Informational expense category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Travel,
    Utilities,
    Entertainment,
    Supplies,
    #[default]
    Other,
}

/// One member's owed portion of an expense. Shares live inside their parent
/// expense document, so expense and shares are written as one unit.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExpenseShare {
    pub member_id: MemberId,
    pub amount_owed: Money,
}

/// A single payment event, immutable once recorded. Corrections happen via
/// a new expense or a settlement, never by editing shares.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: String,
    pub group_id: GroupId,
    pub description: String,
    pub amount: Money,
    pub paid_by: MemberId,
    #[serde(default)]
    pub category: Category,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_ref: Option<String>,
    pub shares: Vec<ExpenseShare>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Completed,
}

/// A direct payment between two members, recorded outside any expense.
/// Only completed settlements count toward balances.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Settlement {
    pub id: String,
    pub group_id: GroupId,
    pub from_member_id: MemberId,
    pub to_member_id: MemberId,
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub status: SettlementStatus,
}
