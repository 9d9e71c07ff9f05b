//! Dense 1..N ordering maintenance for pages within a game and questions
//! within a page.
//!
//! The store backends keep a uniqueness constraint on `(parent, order)`, so
//! swapping two siblings cannot write their final values directly: the plan
//! stages the subject through a placeholder one beyond the current maximum,
//! shifts the neighbour into the vacated slot, then lands the subject. Each
//! intermediate write keeps the constraint satisfied.

use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// Towards order 1.
    Up,
    /// Towards order N.
    Down,
}

/// One staged `(item, order)` write to apply against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderWrite {
    /// Item whose order changes.
    pub id: Uuid,
    /// Order value to write.
    pub order: u32,
}

/// Reasons a move plan cannot be produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    /// The subject is already first (moving up) or last (moving down).
    #[error("item is already at the {0} end")]
    OutOfRange(&'static str),
    /// The subject is not among the provided siblings.
    #[error("item `{0}` is not part of this sequence")]
    UnknownItem(Uuid),
}

/// Order value a freshly appended sibling should receive: max + 1, or 1 when
/// the sequence is empty.
pub fn next_order(orders: &[(Uuid, u32)]) -> u32 {
    orders.iter().map(|(_, order)| *order).max().unwrap_or(0) + 1
}

/// Plan the staged writes that swap `subject` with its neighbour in
/// `direction`.
///
/// The returned writes must be applied in sequence as one atomic unit.
pub fn plan_move(
    orders: &[(Uuid, u32)],
    subject: Uuid,
    direction: MoveDirection,
) -> Result<Vec<OrderWrite>, MoveError> {
    let (_, current) = orders
        .iter()
        .find(|(id, _)| *id == subject)
        .ok_or(MoveError::UnknownItem(subject))?;

    let target = match direction {
        MoveDirection::Up => current
            .checked_sub(1)
            .filter(|order| *order >= 1)
            .ok_or(MoveError::OutOfRange("top"))?,
        MoveDirection::Down => current + 1,
    };

    let (neighbour, _) = orders
        .iter()
        .find(|(_, order)| *order == target)
        .ok_or(match direction {
            MoveDirection::Up => MoveError::OutOfRange("top"),
            MoveDirection::Down => MoveError::OutOfRange("bottom"),
        })?;

    let placeholder = next_order(orders);
    Ok(vec![
        OrderWrite {
            id: subject,
            order: placeholder,
        },
        OrderWrite {
            id: *neighbour,
            order: *current,
        },
        OrderWrite {
            id: subject,
            order: target,
        },
    ])
}

/// Writes that close the gap left by deleting the sibling that held
/// `removed_order`: every sibling above it shifts down by one.
pub fn shift_down_after(orders: &[(Uuid, u32)], removed_order: u32) -> Vec<OrderWrite> {
    let mut writes: Vec<OrderWrite> = orders
        .iter()
        .filter(|(_, order)| *order > removed_order)
        .map(|(id, order)| OrderWrite {
            id: *id,
            order: order - 1,
        })
        .collect();
    // Apply lowest first so the unique constraint holds mid-sequence.
    writes.sort_by_key(|write| write.order);
    writes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(n: u32) -> Vec<(Uuid, u32)> {
        (1..=n).map(|order| (Uuid::new_v4(), order)).collect()
    }

    fn apply(orders: &mut Vec<(Uuid, u32)>, writes: &[OrderWrite]) {
        for write in writes {
            let slot = orders.iter_mut().find(|(id, _)| *id == write.id).unwrap();
            slot.1 = write.order;
        }
    }

    fn assert_dense(orders: &[(Uuid, u32)]) {
        let mut seen: Vec<u32> = orders.iter().map(|(_, order)| *order).collect();
        seen.sort_unstable();
        let expected: Vec<u32> = (1..=orders.len() as u32).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn move_down_swaps_with_next_sibling() {
        // Two questions ordered [1, 2]; moving the first down swaps them.
        let mut orders = sequence(2);
        let (first, _) = orders[0];
        let (second, _) = orders[1];

        let plan = plan_move(&orders, first, MoveDirection::Down).unwrap();
        apply(&mut orders, &plan);

        assert_eq!(orders.iter().find(|(id, _)| *id == first).unwrap().1, 2);
        assert_eq!(orders.iter().find(|(id, _)| *id == second).unwrap().1, 1);
        assert_dense(&orders);
    }

    #[test]
    fn move_up_swaps_with_previous_sibling() {
        let mut orders = sequence(3);
        let (third, _) = orders[2];
        let (second, _) = orders[1];

        let plan = plan_move(&orders, third, MoveDirection::Up).unwrap();
        apply(&mut orders, &plan);

        assert_eq!(orders.iter().find(|(id, _)| *id == third).unwrap().1, 2);
        assert_eq!(orders.iter().find(|(id, _)| *id == second).unwrap().1, 3);
        assert_dense(&orders);
    }

    #[test]
    fn plan_stages_through_placeholder() {
        let orders = sequence(3);
        let (first, _) = orders[0];

        let plan = plan_move(&orders, first, MoveDirection::Down).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].order, 4); // one beyond the current maximum
        assert_eq!(plan[1].order, 1);
        assert_eq!(plan[2].order, 2);

        // No intermediate prefix duplicates an order held by another item.
        let mut scratch = orders.clone();
        for write in &plan {
            let slot = scratch.iter_mut().find(|(id, _)| *id == write.id).unwrap();
            slot.1 = write.order;
            let mut values: Vec<u32> = scratch.iter().map(|(_, order)| *order).collect();
            values.sort_unstable();
            values.dedup();
            assert_eq!(values.len(), scratch.len());
        }
    }

    #[test]
    fn first_cannot_move_up_and_last_cannot_move_down() {
        let orders = sequence(3);
        let (first, _) = orders[0];
        let (last, _) = orders[2];

        assert_eq!(
            plan_move(&orders, first, MoveDirection::Up),
            Err(MoveError::OutOfRange("top"))
        );
        assert_eq!(
            plan_move(&orders, last, MoveDirection::Down),
            Err(MoveError::OutOfRange("bottom"))
        );
    }

    #[test]
    fn unknown_subject_is_reported() {
        let orders = sequence(2);
        let stranger = Uuid::new_v4();
        assert_eq!(
            plan_move(&orders, stranger, MoveDirection::Up),
            Err(MoveError::UnknownItem(stranger))
        );
    }

    #[test]
    fn single_item_cannot_move_either_way() {
        let orders = sequence(1);
        let (only, _) = orders[0];
        assert!(plan_move(&orders, only, MoveDirection::Up).is_err());
        assert!(plan_move(&orders, only, MoveDirection::Down).is_err());
    }

    #[test]
    fn next_order_appends_after_maximum() {
        assert_eq!(next_order(&[]), 1);
        assert_eq!(next_order(&sequence(4)), 5);
    }

    #[test]
    fn deletion_shifts_only_higher_siblings() {
        // Orders [1, 2, 3]; deleting order 2 leaves the first untouched and
        // shifts the third down to 2.
        let orders = sequence(3);
        let (first, _) = orders[0];
        let (third, _) = orders[2];

        let writes = shift_down_after(&orders, 2);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].id, third);
        assert_eq!(writes[0].order, 2);
        assert!(writes.iter().all(|write| write.id != first));
    }

    #[test]
    fn gap_close_writes_never_collide_mid_sequence() {
        // Deleting order 1 of [1..=5] shifts four siblings. The store
        // backends enforce uniqueness per write, so every prefix of the
        // returned sequence must leave the orders distinct; 5 -> 4 before
        // 4 -> 3 would collide.
        let mut orders = sequence(5);
        let removed_order = orders.remove(0).1;

        let writes = shift_down_after(&orders, removed_order);
        let planned: Vec<u32> = writes.iter().map(|write| write.order).collect();
        assert_eq!(planned, vec![1, 2, 3, 4]);

        for write in &writes {
            let slot = orders.iter_mut().find(|(id, _)| *id == write.id).unwrap();
            slot.1 = write.order;
            let mut values: Vec<u32> = orders.iter().map(|(_, order)| *order).collect();
            values.sort_unstable();
            values.dedup();
            assert_eq!(values.len(), orders.len());
        }
        assert_dense(&orders);
    }

    #[test]
    fn density_holds_across_mixed_operations() {
        let mut orders = sequence(5);

        let (subject, _) = orders[1];
        let plan = plan_move(&orders, subject, MoveDirection::Down).unwrap();
        apply(&mut orders, &plan);
        assert_dense(&orders);

        // Delete the item currently at order 3.
        let removed = orders.iter().find(|(_, order)| *order == 3).unwrap().0;
        let removed_order = 3;
        orders.retain(|(id, _)| *id != removed);
        let writes = shift_down_after(&orders, removed_order);
        apply(&mut orders, &writes);
        assert_dense(&orders);

        // Append a new sibling.
        orders.push((Uuid::new_v4(), next_order(&orders)));
        assert_dense(&orders);
    }
}
