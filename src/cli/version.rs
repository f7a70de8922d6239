/// Display version information
pub fn execute() {
    println!("cosign {}", env!("CARGO_PKG_VERSION"));
    println!("Multi-signature transaction proposals");
}
