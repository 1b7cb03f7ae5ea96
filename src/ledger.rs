use std::collections::{HashMap, HashSet};

use bson::oid::ObjectId;
use chrono::Utc;
use tracing::info;

use crate::balance::{compute_balances, compute_pairwise_balances, NetBalances, PairBalance};
use crate::error::LedgerError;
use crate::money::Money;
use crate::schemas::{
    Category, Expense, ExpenseShare, Group, MemberId, Settlement, SettlementStatus,
};
use crate::store::LedgerStore;

/// Share sums may differ from the expense amount by at most one cent.
pub const SHARE_TOLERANCE: Money = Money::from_minor(1);

/// A not-yet-validated expense as submitted by a caller.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub description: String,
    pub amount: Money,
    pub paid_by: MemberId,
    pub category: Category,
    pub notes: Option<String>,
    pub receipt_ref: Option<String>,
    pub shares: HashMap<MemberId, Money>,
}

/// An equal-split expense over an ordered participant list.
#[derive(Clone, Debug)]
pub struct NewEqualSplitExpense {
    pub description: String,
    pub amount: Money,
    pub paid_by: MemberId,
    pub category: Category,
    pub notes: Option<String>,
    pub receipt_ref: Option<String>,
    pub participants: Vec<MemberId>,
}

/// The ledger engine: validates and records expenses and settlements,
/// and derives balances on demand.
///
/// Stateless between calls; every read recomputes from the store, and every
/// write is either fully validated and persisted or rejected with no effect.
pub struct LedgerEngine<S> {
    store: S,
}

impl<S: LedgerStore> LedgerEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn record_expense(
        &self,
        group_id: &str,
        new: NewExpense,
    ) -> Result<Expense, LedgerError> {
        let description = new.description.trim();
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }
        if !new.amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }

        let group = self.group(group_id).await?;
        if !group.has_member(&new.paid_by) {
            return Err(LedgerError::UnknownMember(new.paid_by));
        }
        for (member_id, owed) in &new.shares {
            if !group.has_member(member_id) {
                return Err(LedgerError::UnknownMember(member_id.clone()));
            }
            if owed.is_negative() {
                return Err(LedgerError::InvalidAmount);
            }
        }
        validate_share_sum(&new.shares, &new.paid_by, new.amount)?;

        // Stored share order is deterministic regardless of map iteration.
        let mut shares: Vec<ExpenseShare> = new
            .shares
            .into_iter()
            .map(|(member_id, amount_owed)| ExpenseShare {
                member_id,
                amount_owed,
            })
            .collect();
        shares.sort_by(|a, b| a.member_id.cmp(&b.member_id));

        let expense = Expense {
            id: ObjectId::new().to_hex(),
            group_id: group_id.to_owned(),
            description: description.to_owned(),
            amount: new.amount,
            paid_by: new.paid_by,
            category: new.category,
            date: Utc::now(),
            notes: new.notes,
            receipt_ref: new.receipt_ref,
            shares,
        };
        self.store.insert_expense_with_shares(&expense).await?;
        info!(expense = %expense.id, group = group_id, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    pub async fn record_equal_split_expense(
        &self,
        group_id: &str,
        new: NewEqualSplitExpense,
    ) -> Result<Expense, LedgerError> {
        if !new.amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }

        // Repeated participants collapse onto their first occurrence so the
        // residual-cent order stays well defined.
        let mut seen = HashSet::new();
        let participants: Vec<MemberId> = new
            .participants
            .into_iter()
            .filter(|m| seen.insert(m.clone()))
            .collect();
        if participants.is_empty() {
            return Err(LedgerError::ShareMismatch {
                shares: Money::ZERO,
                amount: new.amount,
            });
        }

        let shares = equal_split(new.amount, &participants).into_iter().collect();
        self.record_expense(
            group_id,
            NewExpense {
                description: new.description,
                amount: new.amount,
                paid_by: new.paid_by,
                category: new.category,
                notes: new.notes,
                receipt_ref: new.receipt_ref,
                shares,
            },
        )
        .await
    }

    pub async fn record_settlement(
        &self,
        group_id: &str,
        from_member_id: &str,
        to_member_id: &str,
        amount: Money,
    ) -> Result<Settlement, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }
        if from_member_id == to_member_id {
            return Err(LedgerError::SameMember);
        }

        let group = self.group(group_id).await?;
        for member_id in [from_member_id, to_member_id] {
            if !group.has_member(member_id) {
                return Err(LedgerError::UnknownMember(member_id.to_owned()));
            }
        }

        let settlement = Settlement {
            id: ObjectId::new().to_hex(),
            group_id: group_id.to_owned(),
            from_member_id: from_member_id.to_owned(),
            to_member_id: to_member_id.to_owned(),
            amount,
            date: Utc::now(),
            status: SettlementStatus::Completed,
        };
        self.store.insert_settlement(&settlement).await?;
        info!(settlement = %settlement.id, group = group_id, amount = %amount, "settlement recorded");
        Ok(settlement)
    }

    pub async fn balances(&self, group_id: &str) -> Result<NetBalances, LedgerError> {
        let group = self.group(group_id).await?;
        let expenses = self.store.list_expenses(group_id).await?;
        let settlements = self.store.list_settlements(group_id).await?;
        Ok(compute_balances(&group, &expenses, &settlements))
    }

    pub async fn pairwise_balances(
        &self,
        group_id: &str,
    ) -> Result<Vec<PairBalance>, LedgerError> {
        self.group(group_id).await?;
        let expenses = self.store.list_expenses(group_id).await?;
        let settlements = self.store.list_settlements(group_id).await?;
        Ok(compute_pairwise_balances(&expenses, &settlements))
    }

    async fn group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.store
            .find_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_owned()))
    }
}

/// Checks that the submitted shares account for the expense amount.
///
/// A zero or missing payer share means the payer keeps whatever the other
/// shares leave of the amount as their own, implicitly self-owed portion;
/// with an explicit positive payer share the split must cover the full
/// amount. Either way the non-payer shares can never exceed the amount.
fn validate_share_sum(
    shares: &HashMap<MemberId, Money>,
    paid_by: &str,
    amount: Money,
) -> Result<(), LedgerError> {
    let payer_share = shares.get(paid_by).copied().unwrap_or(Money::ZERO);
    let others: Money = shares
        .iter()
        .filter(|(member_id, _)| member_id.as_str() != paid_by)
        .map(|(_, owed)| *owed)
        .sum();

    let ok = if payer_share.is_positive() {
        (others + payer_share - amount).abs() <= SHARE_TOLERANCE
    } else {
        others - amount <= SHARE_TOLERANCE
    };
    if ok {
        Ok(())
    } else {
        Err(LedgerError::ShareMismatch {
            shares: others + payer_share,
            amount,
        })
    }
}

/// Divides `amount` evenly across `participants`: everyone gets the
/// floor-to-cent share, and the leftover cents go one each to the first
/// participants in the order given, so the shares sum to exactly `amount`.
pub fn equal_split(amount: Money, participants: &[MemberId]) -> Vec<(MemberId, Money)> {
    let n = participants.len() as i64;
    let base = amount.as_minor() / n;
    let remainder = amount.as_minor() % n;

    participants
        .iter()
        .enumerate()
        .map(|(i, member_id)| {
            let extra = i64::from((i as i64) < remainder);
            (member_id.clone(), Money::from_minor(base + extra))
        })
        .collect()
}
