use gangway_core::{ForeignAllocator as _, ForeignValue as _, MarshalError};
use gangway_testsuite::ProbeValue;
use pretty_assertions::assert_eq;

use super::probe_marshaler;

#[test]
fn first_call_materializes_a_fresh_value() {
    let mut marshaler = probe_marshaler();
    let handle = marshaler.allocator_mut().adopt_foreign(ProbeValue::foreign_bytes(99));

    let value = marshaler.convert_in(handle).unwrap();

    assert_eq!(value.payload(), 99);
    assert_eq!(marshaler.stage(), 1);
    assert_eq!(marshaler.depth(), 1);
    assert_eq!(marshaler.current_buffer(), Some(handle));

    // The inbound frame does not own the foreign side's buffer; releasing
    // the frame leaves the buffer alone.
    marshaler.release_foreign();
    assert_eq!(marshaler.stage(), 0);
    assert_eq!(marshaler.allocator().live(), 1);
    assert_eq!(marshaler.allocator().released(), 0);
}

#[test]
fn matching_handle_merges_into_the_tracked_value() {
    let mut marshaler = probe_marshaler();
    let value = ProbeValue::new(5);

    let handle = marshaler.convert_out(&value).unwrap();
    // The foreign side writes its result into the buffer.
    marshaler
        .allocator_mut()
        .buffer_mut(handle)
        .copy_from_slice(&ProbeValue::foreign_bytes(1234));

    let refreshed = marshaler.convert_in(handle).unwrap();

    // Merge, not replacement: the original instance observes the update
    // and the returned value has the same identity.
    assert_eq!(value.payload(), 1234);
    assert_eq!(refreshed.payload(), 1234);
    assert_eq!(refreshed.identity(), value.identity());
    assert_eq!(marshaler.stage(), 2);

    marshaler.release_foreign();
    assert_eq!(marshaler.allocator().live(), 0);
}

#[test]
fn foreign_handle_mismatch_pushes_a_child_frame() {
    let mut marshaler = probe_marshaler();
    let outer = ProbeValue::new(5);

    let outer_handle = marshaler.convert_out(&outer).unwrap();

    // Before the outer conversion completes, the foreign side calls back
    // into managed code with a buffer of its own.
    let nested_handle = marshaler.allocator_mut().adopt_foreign(ProbeValue::foreign_bytes(77));
    let nested = marshaler.convert_in(nested_handle).unwrap();

    assert_eq!(nested.payload(), 77);
    assert_eq!(outer.payload(), 5);
    assert_eq!(marshaler.depth(), 2);
    assert_eq!(marshaler.stage(), 1);
    assert_eq!(marshaler.current_buffer(), Some(nested_handle));

    // The nested inbound conversion finishes: the managed result is
    // written back out into the same foreign buffer.
    let written_back = marshaler.convert_out(&nested).unwrap();
    assert_eq!(written_back, nested_handle);
    assert_eq!(marshaler.stage(), 2);

    marshaler.release_managed();
    assert_eq!(marshaler.depth(), 1);
    assert_eq!(marshaler.stage(), 1);
    assert_eq!(marshaler.current_buffer(), Some(outer_handle));

    marshaler.release_foreign();
    assert_eq!(marshaler.stage(), 0);
    // Only the foreign side's own buffer remains live.
    assert_eq!(marshaler.allocator().live(), 1);
}

#[test]
fn third_call_with_the_same_handle_splits_the_frame() {
    let mut marshaler = probe_marshaler();
    let handle = marshaler.allocator_mut().adopt_foreign(ProbeValue::foreign_bytes(10));

    let first = marshaler.convert_in(handle).unwrap();
    let second = marshaler.convert_in(handle).unwrap();
    assert_eq!(marshaler.stage(), 2);
    assert_eq!(first.identity(), second.identity());

    // Same handle replayed for a third call: split and retry.
    let third = marshaler.convert_in(handle).unwrap();
    assert_eq!(marshaler.depth(), 2);
    assert_eq!(marshaler.stage(), 2);
    assert_eq!(third.identity(), first.identity());

    marshaler.release_foreign();
    marshaler.release_managed();
    assert_eq!(marshaler.depth(), 1);
    assert_eq!(marshaler.stage(), 0);
}

#[test]
fn deserialization_failure_is_retry_safe() {
    let mut marshaler = probe_marshaler();
    let handle = marshaler.allocator_mut().adopt_foreign(vec![0; 3]);

    let error = marshaler.convert_in(handle).unwrap_err();
    assert_eq!(
        error,
        MarshalError::NotEnoughBytes {
            received: 3,
            expected: ProbeValue::FOREIGN_SIZE,
        }
    );
    assert_eq!(marshaler.stage(), 0);
    assert_eq!(marshaler.depth(), 1);
}
