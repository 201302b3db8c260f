pub const SUCCESS: i32 = 0;
/// Output could not be produced (serialization, stdout)
pub const EXECUTION_ERROR: i32 = 1;
/// Bad config file, arguments or paths
pub const INPUT_ERROR: i32 = 2;
/// Recordings failed to load or a sample failed its checks
pub const DATA_ERROR: i32 = 3;
