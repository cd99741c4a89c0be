// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::Store;
use devloop_core::DesignId;
use std::path::Path;

fn store_with_design(id: &str) -> (Store, DesignId) {
    let store = Store::open_in_memory().unwrap();
    let id = DesignId::from_string(id);
    store.create_design(&id, "x").unwrap();
    (store, id)
}

#[test]
fn outputs_accumulate_per_key() {
    let (store, id) = store_with_design("dsn-a");
    store.record_output(&id, "design_doc", Path::new("/designs/dsn-a/design/design_doc.md")).unwrap();
    store
        .record_output(&id, "design_doc.r1", Path::new("/designs/dsn-a/design/design_doc.r1.md"))
        .unwrap();

    let outputs = store.list_outputs(&id).unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].key, "design_doc");
    assert_eq!(outputs[1].key, "design_doc.r1");
}

#[test]
fn same_key_replaces_path() {
    let (store, id) = store_with_design("dsn-a");
    store.record_output(&id, "design_doc", Path::new("/old/path.md")).unwrap();
    store.record_output(&id, "design_doc", Path::new("/new/path.md")).unwrap();

    let output = store.get_output(&id, "design_doc").unwrap().unwrap();
    assert_eq!(output.path, Path::new("/new/path.md"));
    assert_eq!(store.list_outputs(&id).unwrap().len(), 1);
}

#[test]
fn unknown_key_is_none() {
    let (store, id) = store_with_design("dsn-a");
    assert!(store.get_output(&id, "design_doc").unwrap().is_none());
}
