/// Logs a milestone message.
///
/// Emitted as an `INFO` event on the `sweepr::success` target so terminal
/// formatters can render it differently from ordinary progress.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "sweepr::success", $($arg)*)
    };
}
