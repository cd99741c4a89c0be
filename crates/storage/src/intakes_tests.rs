// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::Store;
use devloop_core::DesignId;

#[test]
fn intake_round_trips() {
    let store = Store::open_in_memory().unwrap();
    let id = DesignId::from_string("dsn-a");
    store.create_design(&id, "x").unwrap();
    store.record_intake(&id, "C1", Some("1717171717.000100"), "U1", "ada").unwrap();

    let intake = store.get_intake(&id).unwrap().unwrap();
    assert_eq!(intake.channel, "C1");
    assert_eq!(intake.thread_ts.as_deref(), Some("1717171717.000100"));
    assert_eq!(intake.requester_name, "ada");
}

#[test]
fn duplicate_intake_keeps_first_record() {
    let store = Store::open_in_memory().unwrap();
    let id = DesignId::from_string("dsn-a");
    store.create_design(&id, "x").unwrap();
    store.record_intake(&id, "C1", None, "U1", "ada").unwrap();
    store.record_intake(&id, "C2", None, "U2", "bob").unwrap();
    assert_eq!(store.get_intake(&id).unwrap().unwrap().channel, "C1");
}

#[test]
fn missing_intake_is_none() {
    let store = Store::open_in_memory().unwrap();
    let id = DesignId::from_string("dsn-a");
    store.create_design(&id, "x").unwrap();
    assert!(store.get_intake(&id).unwrap().is_none());
}
