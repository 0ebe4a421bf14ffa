use std::sync::Arc;

use oxec_dtype::{AccessMode, ImageKind, ScalarType};

use crate::test::MockRuntime;
use crate::{ArgKind, Error, KernelArg, NativeHandle, NativeRuntime};

const LOCAL_LIMIT: usize = 48 * 1024;

fn one_of_each(runtime: Arc<MockRuntime>) -> Vec<KernelArg> {
    let runtime = runtime as Arc<dyn NativeRuntime>;
    vec![
        KernelArg::scalar(runtime.clone(), ScalarType::Int32, &7i32.to_ne_bytes()).unwrap(),
        KernelArg::buffer(runtime.clone(), ScalarType::Float32, 1024, AccessMode::ReadWrite).unwrap(),
        KernelArg::local(runtime.clone(), 256, LOCAL_LIMIT).unwrap(),
        KernelArg::image(runtime, ImageKind::Float, &[64, 64], AccessMode::ReadOnly).unwrap(),
    ]
}

#[test]
fn disposed_starts_false_and_never_reverts() {
    let mock = MockRuntime::new();
    let mut arg = KernelArg::buffer(mock.clone(), ScalarType::UInt8, 16, AccessMode::ReadOnly).unwrap();

    assert!(!arg.is_disposed());
    arg.dispose().unwrap();
    assert!(arg.is_disposed());
    arg.dispose().unwrap();
    assert!(arg.is_disposed());
}

#[test]
fn buffer_lifecycle() {
    // 1024-byte buffer: allocation succeeds, handle is non-null, disposal
    // releases exactly once, the second dispose never reaches the runtime.
    let mock = MockRuntime::new();
    let mut arg = KernelArg::buffer(mock.clone(), ScalarType::Float32, 1024, AccessMode::ReadWrite).unwrap();

    assert!(!arg.handle().unwrap().is_null());
    assert!(!arg.is_disposed());
    assert_eq!(mock.allocations(), 1);

    arg.dispose().unwrap();
    assert!(arg.is_disposed());
    assert_eq!(mock.releases(), 1);

    arg.dispose().unwrap();
    assert_eq!(mock.releases(), 1);
}

#[test]
fn handle_after_dispose_fails_for_every_kind() {
    let mock = MockRuntime::new();
    for mut arg in one_of_each(mock) {
        let kind = arg.kind().name();
        arg.dispose().unwrap();
        match arg.handle() {
            Err(Error::UseAfterDispose { kind: reported }) => assert_eq!(reported, kind),
            other => panic!("{kind}: expected UseAfterDispose, got {other:?}"),
        }
    }
}

#[test]
fn local_rejects_zero_size_without_native_calls() {
    let mock = MockRuntime::new();
    let err = KernelArg::local(mock.clone(), 0, LOCAL_LIMIT).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(mock.allocations(), 0);
}

#[test]
fn local_rejects_sizes_beyond_device_limit() {
    let mock = MockRuntime::new();
    let err = KernelArg::local(mock.clone(), LOCAL_LIMIT + 1, LOCAL_LIMIT).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(mock.allocations(), 0);
}

#[test]
fn scalar_rejects_mismatched_payload_width() {
    let mock = MockRuntime::new();
    let err = KernelArg::scalar(mock.clone(), ScalarType::Int32, &[1, 2]).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(mock.allocations(), 0);
}

#[test]
fn buffer_rejects_zero_and_misaligned_sizes() {
    let mock = MockRuntime::new();

    let err = KernelArg::buffer(mock.clone(), ScalarType::Float32, 0, AccessMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let err = KernelArg::buffer(mock.clone(), ScalarType::Float32, 10, AccessMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    assert_eq!(mock.allocations(), 0);
}

#[test]
fn image_rejects_bad_extents() {
    let mock = MockRuntime::new();

    let err = KernelArg::image(mock.clone(), ImageKind::Half, &[], AccessMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let err = KernelArg::image(mock.clone(), ImageKind::Half, &[4, 0], AccessMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let err = KernelArg::image(mock.clone(), ImageKind::Half, &[2, 2, 2, 2], AccessMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    assert_eq!(mock.allocations(), 0);
}

#[test]
fn failed_release_still_retires_the_argument() {
    let mock = MockRuntime::new();
    let mut arg = KernelArg::local(mock.clone(), 128, LOCAL_LIMIT).unwrap();
    let handle = arg.handle().unwrap();
    mock.fail_release_of(handle);

    let err = arg.dispose().unwrap_err();
    assert!(matches!(err, Error::NativeRelease { .. }));
    assert!(arg.is_disposed());
    assert!(matches!(arg.handle(), Err(Error::UseAfterDispose { .. })));

    // Retired means retired: no second native release.
    arg.dispose().unwrap();
    assert_eq!(mock.releases(), 1);
}

#[test]
fn drop_releases_exactly_once() {
    let mock = MockRuntime::new();
    {
        let _arg = KernelArg::buffer(mock.clone(), ScalarType::Int64, 64, AccessMode::WriteOnly).unwrap();
    }
    assert_eq!(mock.allocations(), 1);
    assert_eq!(mock.releases(), 1);
}

#[test]
fn drop_after_dispose_does_not_release_again() {
    let mock = MockRuntime::new();
    {
        let mut arg = KernelArg::buffer(mock.clone(), ScalarType::Int64, 64, AccessMode::WriteOnly).unwrap();
        arg.dispose().unwrap();
    }
    assert_eq!(mock.releases(), 1);
}

#[test]
fn from_raw_rejects_the_null_handle() {
    let mock = MockRuntime::new();
    let err = KernelArg::from_raw(mock, NativeHandle::NULL, ArgKind::Local { size: 8 }).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test]
fn from_raw_adopts_and_releases_a_foreign_handle() {
    let mock = MockRuntime::new();
    let handle = NativeHandle::from_raw(0xbeef);
    let mut arg = KernelArg::from_raw(mock.clone(), handle, ArgKind::Buffer {
        elem: ScalarType::UInt8,
        size: 32,
        access: AccessMode::ReadOnly,
    })
    .unwrap();

    assert_eq!(arg.handle().unwrap(), handle);
    arg.dispose().unwrap();
    assert_eq!(mock.releases(), 1);
    assert_eq!(mock.allocations(), 0);
}
