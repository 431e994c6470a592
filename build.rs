fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_client(false)
        .compile(&["proto/fleet.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/fleet.proto");
    Ok(())
}
