use gangway_core::ForeignAllocator as _;
use gangway_marshal::Marshaler;
use gangway_testsuite::{BlobValue, MemoryAllocator, ProbeValue};
use pretty_assertions::assert_eq;

use super::probe_marshaler;

#[test]
fn convert_in_of_convert_out_reconstructs_the_value() {
    let mut marshaler = probe_marshaler();
    let value = ProbeValue::new(0xFEED);

    let handle = marshaler.convert_out(&value).unwrap();
    let back = marshaler.convert_in(handle).unwrap();

    assert_eq!(back, value);
    marshaler.release_foreign();
}

#[test]
fn serialized_bytes_reconstruct_the_value_on_another_thread_stack() {
    let mut outbound = probe_marshaler();
    let value = ProbeValue::new(31337);
    let handle = outbound.convert_out(&value).unwrap();
    let bytes = outbound.allocator().buffer(handle).to_vec();
    outbound.release_foreign();

    let mut inbound = probe_marshaler();
    let foreign = inbound.allocator_mut().adopt_foreign(bytes);
    let back = inbound.convert_in(foreign).unwrap();

    assert_eq!(back, value);
}

#[test]
fn blob_values_round_trip_with_per_value_sizing() {
    let mut outbound: Marshaler<BlobValue, MemoryAllocator> = Marshaler::new(MemoryAllocator::new());
    let value = BlobValue::new(b"boundary crossing".to_vec());

    let handle = outbound.convert_out(&value).unwrap();
    assert_eq!(outbound.allocator().buffer(handle).len(), 4 + 17);

    let bytes = outbound.allocator().buffer(handle).to_vec();
    outbound.release_foreign();

    let mut inbound: Marshaler<BlobValue, MemoryAllocator> = Marshaler::new(MemoryAllocator::new());
    let foreign = inbound.allocator_mut().adopt_foreign(bytes);
    let back = inbound.convert_in(foreign).unwrap();

    assert_eq!(back, value);
}

#[test]
fn size_hint_reports_static_size_or_unknown() {
    // Fixed-size representation: known ahead of allocation.
    assert_eq!(Marshaler::<ProbeValue, MemoryAllocator>::size_hint(), Some(8));
    // Variable-size representation: determined per value at convert_out.
    assert_eq!(Marshaler::<BlobValue, MemoryAllocator>::size_hint(), None);
}
