pub fn dump(prefix: &str, bytes: &[u8]) {
    for s in hexdump::hexdump_iter(bytes) {
        if prefix.is_empty() {
            println!("{}", s);
        } else {
            println!("{} {}", prefix, s);
        }
    }
}
