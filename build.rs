//! Build script for fast3d-print.
//!
//! In a production build, this would:
//! 1. Locate a libtorch installation (or download a prebuilt one)
//! 2. Compile the native Shap-E diffusion runtime against it
//! 3. Generate Rust FFI bindings via bindgen
//!
//! For now, it's a placeholder that documents the intended build process.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Future: link the native diffusion runtime.
    //
    // Steps:
    // 1. Check for libtorch (LIBTORCH env var or system install)
    // 2. Check for CUDA toolkit (nvcc) when the cuda feature is on
    // 3. Use cc::Build to compile the C++ pipeline shims
    // 4. Link against torch_cpu (and torch_cuda, cudart for GPU builds)
    // 5. Generate bindings with bindgen
    //
    // Example (when implemented):
    //
    // ```
    // let libtorch = std::env::var("LIBTORCH")
    //     .unwrap_or_else(|_| "/usr/local/libtorch".to_string());
    //
    // cc::Build::new()
    //     .cpp(true)
    //     .file("native/shap_e_runtime.cpp")
    //     .include(format!("{libtorch}/include"))
    //     .flag("-std=c++17")
    //     .compile("shap_e_runtime");
    //
    // println!("cargo:rustc-link-search={libtorch}/lib");
    // println!("cargo:rustc-link-lib=torch_cpu");
    // println!("cargo:rustc-link-lib=torch_cuda");
    // println!("cargo:rustc-link-lib=cudart");
    // ```

    #[cfg(feature = "cuda")]
    {
        println!("cargo:warning=CUDA feature enabled — ensure CUDA toolkit is installed");
    }
}
