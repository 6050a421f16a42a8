fn main() {
    // Set the deployment target to match our minimum system version
    println!("cargo:rustc-env=MACOSX_DEPLOYMENT_TARGET=11.0");

    // The headless library and CLI have no bundle to generate.
    #[cfg(feature = "desktop")]
    tauri_build::build()
}
