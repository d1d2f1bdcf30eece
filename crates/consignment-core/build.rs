/// Generates the gRPC client and server bindings for `proto/consignment.proto`.
///
/// Both services (`ProductInfo` and `OrderManagement`) are emitted into the
/// crate's `OUT_DIR`, together with an encoded file descriptor set that the
/// server registers with the reflection service.
///
/// # Output
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("consignment");
/// }
/// ```
///
/// # Panics
///
/// Panics if `OUT_DIR` is unset or code generation fails, which aborts the
/// build with the underlying protoc diagnostics.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("consignment_descriptor.bin");

    println!("cargo:rerun-if-changed=proto/consignment.proto");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/consignment.proto"], &["proto"])
        .unwrap();
}
