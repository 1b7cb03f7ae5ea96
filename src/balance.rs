use std::collections::HashMap;

use serde::Serialize;

use crate::money::Money;
use crate::schemas::{Expense, Group, MemberId, Settlement, SettlementStatus};

/// Net position per member: positive means the group owes them, negative
/// means they owe the group.
pub type NetBalances = HashMap<MemberId, Money>;

/// Pairs whose net amount is below this are dropped from the pairwise view.
pub const BALANCE_TOLERANCE: Money = Money::from_minor(1);

/// What one member owes another, after netting both directions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairBalance {
    pub debtor: MemberId,
    pub creditor: MemberId,
    pub amount: Money,
}

/// Computes the net balance of every group member in one pass over the
/// expenses and settlements (O(E·S + T)).
///
/// Each non-payer share moves money from the share's member to the payer;
/// a payer's own share contributes nothing, whether it is missing or
/// recorded as zero. A completed settlement from A to B cancels part of
/// what A owes B, so it moves both nets back toward zero.
pub fn compute_balances(
    group: &Group,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> NetBalances {
    let mut net: NetBalances = group
        .members
        .iter()
        .map(|m| (m.id.clone(), Money::ZERO))
        .collect();

    for expense in expenses {
        for share in &expense.shares {
            if share.member_id == expense.paid_by {
                continue;
            }
            *net.entry(share.member_id.clone()).or_insert(Money::ZERO) -= share.amount_owed;
            *net.entry(expense.paid_by.clone()).or_insert(Money::ZERO) += share.amount_owed;
        }
    }

    for settlement in settlements {
        if settlement.status != SettlementStatus::Completed {
            continue;
        }
        *net.entry(settlement.from_member_id.clone())
            .or_insert(Money::ZERO) += settlement.amount;
        *net.entry(settlement.to_member_id.clone())
            .or_insert(Money::ZERO) -= settlement.amount;
    }

    net
}

/// Computes who owes whom, pair by pair, over the same pass as
/// [`compute_balances`]. Returns a sparse list, pairs netting below
/// [`BALANCE_TOLERANCE`] are omitted, sorted for deterministic output.
pub fn compute_pairwise_balances(
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Vec<PairBalance> {
    // Accumulate per unordered pair; the key keeps the two ids in
    // lexicographic order so both directions of the same relationship land
    // on the same entry, with the sign tracking the direction.
    let mut pair_net: HashMap<(MemberId, MemberId), Money> = HashMap::new();

    let mut apply = |debtor: &str, creditor: &str, amount: Money| {
        let (key, signed) = if debtor < creditor {
            ((debtor.to_owned(), creditor.to_owned()), amount)
        } else {
            ((creditor.to_owned(), debtor.to_owned()), -amount)
        };
        *pair_net.entry(key).or_insert(Money::ZERO) += signed;
    };

    for expense in expenses {
        for share in &expense.shares {
            if share.member_id == expense.paid_by {
                continue;
            }
            apply(&share.member_id, &expense.paid_by, share.amount_owed);
        }
    }

    for settlement in settlements {
        if settlement.status != SettlementStatus::Completed {
            continue;
        }
        apply(
            &settlement.from_member_id,
            &settlement.to_member_id,
            -settlement.amount,
        );
    }

    let mut pairs: Vec<PairBalance> = pair_net
        .into_iter()
        .filter(|(_, net)| net.abs() >= BALANCE_TOLERANCE)
        .map(|((first, second), net)| {
            if net.is_positive() {
                PairBalance {
                    debtor: first,
                    creditor: second,
                    amount: net,
                }
            } else {
                PairBalance {
                    debtor: second,
                    creditor: first,
                    amount: -net,
                }
            }
        })
        .collect();

    pairs.sort_by(|a, b| (&a.debtor, &a.creditor).cmp(&(&b.debtor, &b.creditor)));
    pairs
}
