fn main() {
    // Window config, capabilities and icons are compiled into the desktop shell
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
