//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# PinPoint Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[sync]
# content_debounce_ms = 300        # 10-10000, tile content edits
# geometry_debounce_ms = 500       # 10-10000, instance moves and resizes
# retry_backoff_max_ms = 30000     # cap for storage retry backoff
# storage_failure_threshold = 3    # 1-100, failures before error:storage

[tiles]
# default_width = 250
# default_height = 150
# min_width = 100
# max_width = 600
# min_height = 80
# max_height = 800

[storage]
# data_dir = "/path/to/pinpoint/data"

[logging]
# level = "info"                   # trace, debug, info, warn, error

# Displays used when no windowing backend reports any.
# Indices follow the order below.
[[displays]]
name = "Display 1"
x = 0
y = 0
width = 1920
height = 1080
scale = 1.0
primary = true
"##
    .to_string()
}
