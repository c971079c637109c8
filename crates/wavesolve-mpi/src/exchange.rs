//! Halo refresh via nearest-neighbour sendrecv.
//!
//! Each rank exchanges one row with each existing neighbour: it sends its
//! edge real row and receives the neighbour's edge real row into its halo.
//! Messages travelling toward lower ranks and toward higher ranks carry
//! distinct tags, so the pairing is unambiguous under any completion
//! order. All four transfers are posted as immediate operations inside
//! one request scope; the scope exit waits for completion.

use mpi::request::{scope, WaitGuard};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::domain::DomainLayout;

/// Tag for messages travelling toward lower ranks.
pub const TAG_UP: i32 = 0;
/// Tag for messages travelling toward higher ranks.
pub const TAG_DOWN: i32 = 1;

/// Refresh both halo rows of one field's slab.
pub fn exchange_halos(world: &SimpleCommunicator, field: &mut [f64], layout: &DomainLayout) {
    if layout.is_empty() {
        return;
    }
    let cols = layout.cols as usize;

    // Carve the slab into disjoint views: top halo, real rows, bottom halo.
    let (top_halo, rest) = field.split_at_mut(if layout.halo_above { cols } else { 0 });
    let body_len = rest.len() - if layout.halo_below { cols } else { 0 };
    let (body, bottom_halo) = rest.split_at_mut(body_len);

    let up = layout.rank as i32 - 1;
    let down = layout.rank as i32 + 1;

    scope(|sc| {
        let _send_up = layout.halo_above.then(|| {
            WaitGuard::from(
                world
                    .process_at_rank(up)
                    .immediate_send_with_tag(sc, &body[..cols], TAG_UP),
            )
        });
        let _send_down = layout.halo_below.then(|| {
            WaitGuard::from(world.process_at_rank(down).immediate_send_with_tag(
                sc,
                &body[body_len - cols..],
                TAG_DOWN,
            ))
        });
        let _recv_up = layout.halo_above.then(|| {
            WaitGuard::from(world.process_at_rank(up).immediate_receive_into_with_tag(
                sc,
                top_halo,
                TAG_DOWN,
            ))
        });
        let _recv_down = layout.halo_below.then(|| {
            WaitGuard::from(world.process_at_rank(down).immediate_receive_into_with_tag(
                sc,
                bottom_halo,
                TAG_UP,
            ))
        });
    });
}
