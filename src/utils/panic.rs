pub fn setup() {
    color_backtrace::install();
}
