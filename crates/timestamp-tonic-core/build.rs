/// Builds the gRPC client and server code for `timestamp.proto` using
/// `tonic-prost-build`.
///
/// The generated messages reference `google.protobuf.Timestamp`, which maps to
/// [`prost_types::Timestamp`] since well-known types are not compiled locally.
///
/// # Files and Paths
///
/// - Proto file: `proto/timestamp.proto`
/// - Includes: `proto/`
/// - Descriptor set: `$OUT_DIR/timestamp_descriptor.bin`, registered with the
///   reflection service by the server.
///
/// # Output
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("timestamp.v1");
/// }
/// ```
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let descriptor_path = out_dir.join("timestamp_descriptor.bin");

    println!("cargo:rerun-if-changed=proto/timestamp.proto");

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(&descriptor_path)
        .compile_protos(&["proto/timestamp.proto"], &["proto"])?;

    Ok(())
}
