//! Build script for symdex-core
//!
//! Checks the compiler before building:
//! - Minimum Rust version (1.70.0, for `Option::is_some_and`)

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    match (rustc_version::version(), rustc_version::Version::parse("1.70.0")) {
        (Ok(found), Ok(minimum)) => {
            assert!(found >= minimum, "symdex-core requires Rust {minimum} or newer, found {found}");
        }
        _ => {
            // Some build environments hide the compiler version; don't fail on them
            println!("cargo:warning=could not verify Rust version");
        }
    }
}
