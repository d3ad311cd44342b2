// Binding generator entry point.
//
// Run against the built library to emit Kotlin/Swift bindings, e.g.:
//   cargo run -p staywake-mobile --bin uniffi-bindgen -- \
//     generate --library target/release/libstaywake_mobile.so \
//     --language kotlin --out-dir target/generated-sources/uniffi/kotlin

fn main() {
    uniffi::uniffi_bindgen_main()
}
