//! Stay Domain
//!
//! Rooms and reservations, plus the front-desk transitions that move them
//! through their lifecycle:
//!
//! ```text
//! Reservation: confirmed ──check_in──▶ checked_in ──check_out──▶ checked_out
//!                  │
//!                  └──cancel──▶ cancelled
//!
//! Room:        available ◀──release── reserved ──occupy──▶ occupied ──check_out──▶ cleaning
//! ```
//!
//! Billing gates check-in on folio settlement; that rule lives in
//! `domain_billing::front_desk`, this crate only guards the state machine.

pub mod room;
pub mod reservation;

pub use room::{Room, RoomStatus};
pub use reservation::{Reservation, ReservationStatus};
