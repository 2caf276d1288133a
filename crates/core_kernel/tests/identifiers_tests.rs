//! Tests for the typed identifiers

use core_kernel::{
    FolioId, GatewayTransactionId, GuestId, LineItemId, PaymentId, ReservationId, RoomId, UserId,
};
use uuid::Uuid;

#[test]
fn test_prefixes() {
    assert_eq!(FolioId::prefix(), "FOL");
    assert_eq!(LineItemId::prefix(), "FLI");
    assert_eq!(PaymentId::prefix(), "PAY");
    assert_eq!(GatewayTransactionId::prefix(), "GTX");
    assert_eq!(GuestId::prefix(), "GST");
    assert_eq!(ReservationId::prefix(), "RSV");
    assert_eq!(RoomId::prefix(), "ROOM");
    assert_eq!(UserId::prefix(), "USR");
}

#[test]
fn test_display_includes_prefix_and_uuid() {
    let uuid = Uuid::new_v4();
    let id = ReservationId::from_uuid(uuid);
    assert_eq!(id.to_string(), format!("RSV-{uuid}"));
}

#[test]
fn test_parse_accepts_prefixed_and_bare() {
    let uuid = Uuid::new_v4();
    let prefixed: FolioId = format!("FOL-{uuid}").parse().unwrap();
    let bare: FolioId = uuid.to_string().parse().unwrap();
    assert_eq!(prefixed, bare);
    assert_eq!(prefixed.as_uuid(), &uuid);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!("FOL-not-a-uuid".parse::<FolioId>().is_err());
    assert!("".parse::<UserId>().is_err());
}

#[test]
fn test_v7_ids_sort_by_creation() {
    let first = LineItemId::new_v7();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = LineItemId::new_v7();
    assert!(first < second);
}

#[test]
fn test_new_ids_are_unique() {
    assert_ne!(PaymentId::new(), PaymentId::new());
}

#[test]
fn test_serde_is_transparent() {
    let uuid = Uuid::new_v4();
    let id = GuestId::from(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));

    let back: GuestId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
