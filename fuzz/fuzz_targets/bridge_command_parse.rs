#![no_main]

use libfuzzer_sys::fuzz_target;
use prbridge_github_issues::issue_command_parser::{
    parse_bridge_command, ParsedBridgeCommand, DEFAULT_COMMAND_PREFIX,
};

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    match parse_bridge_command(&body, DEFAULT_COMMAND_PREFIX) {
        None => {}
        Some(ParsedBridgeCommand::Usage { .. }) => {
            assert!(body.trim_start().len() >= DEFAULT_COMMAND_PREFIX.len());
        }
        Some(ParsedBridgeCommand::Run(command)) => {
            assert!(!command.request_text.trim().is_empty());
            assert_eq!(command.request_text, command.request_text.trim());
            assert!(body.contains(command.request_text.as_str()));
        }
    }
});
