//! Command line to queue translation
//!
//! The command line is a flat list of commands, each followed by a fixed
//! number of arguments:
//!
//! ```text
//! fastboot -s 0123ABCD erase cache flash boot boot.img reboot
//! ```
//!
//! Tokens are consumed left to right. Each command appends its operations
//! to the queue immediately, except for the reboot requests which are only
//! resolved once the whole line has been read, so the reboot always ends
//! up last.

use std::path::Path;

use crate::device::MatchFilter;
use crate::error::{Error, Result};
use crate::loader::load_file;
use crate::package::plan_package;
use crate::queue::CommandQueue;

/// Required size of a signature blob
pub const SIGNATURE_SIZE: usize = 256;

/// Reboot requested on the command line
///
/// Variants are ordered by priority: a plain reboot wins over a reboot into
/// the bootloader when both were asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum RebootIntent {
    #[default]
    None,
    RebootBootloader,
    Reboot,
}

impl RebootIntent {
    /// Combine with a new request, keeping the higher priority one
    pub fn request(self, other: RebootIntent) -> RebootIntent {
        self.max(other)
    }

    /// Append the trailing reboot operation, if any
    pub fn resolve(self, queue: &mut CommandQueue) {
        match self {
            RebootIntent::None => {}
            RebootIntent::Reboot => queue.reboot(),
            RebootIntent::RebootBootloader => {
                queue.command("reboot-bootloader", "rebooting into bootloader")
            }
        }
    }
}

/// Everything needed to run one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Device selection for discovery
    pub filter: MatchFilter,
    /// Operations to run, reboot included
    pub queue: CommandQueue,
}

/// Parse a vendor id the way `strtoul(s, .., 0)` would, requiring 16 bits
///
/// `0x`/`0X` selects hex, a leading `0` selects octal, anything else is
/// decimal. The whole token must be a number.
pub fn parse_vendor_id(s: &str) -> Result<u16> {
    let invalid = || Error::Argument(format!("invalid vendor id '{}'", s));

    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let value = u32::from_str_radix(digits, radix).map_err(|_| invalid())?;
    u16::try_from(value).map_err(|_| invalid())
}

/// Cursor over the command line tokens
struct Tokens<'a, S> {
    tokens: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> Tokens<'a, S> {
    fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    /// Take `command` and its `args` arguments, failing if the line ends early
    fn take(&mut self, command: &str, args: usize) -> Result<Vec<&'a str>> {
        if self.remaining() < args + 1 {
            return Err(Error::Usage(format!(
                "'{}' requires {} argument{}",
                command,
                args,
                if args == 1 { "" } else { "s" }
            )));
        }

        let taken = self.tokens[self.pos + 1..self.pos + 1 + args]
            .iter()
            .map(AsRef::as_ref)
            .collect();
        self.pos += args + 1;
        Ok(taken)
    }

    /// Take every remaining token, the current one included
    fn take_rest(&mut self) -> Vec<&'a str> {
        let rest = self.tokens[self.pos..].iter().map(AsRef::as_ref).collect();
        self.pos = self.tokens.len();
        rest
    }
}

/// Translate command line tokens into an [`Invocation`]
///
/// `default_serial` is used unless `-s` appears on the line. Any malformed
/// command aborts the whole parse; nothing built so far is returned.
pub fn build_queue<S: AsRef<str>>(tokens: &[S], default_serial: Option<String>) -> Result<Invocation> {
    let mut filter = MatchFilter {
        vendor_id: None,
        serial: default_serial.filter(|s| !s.is_empty()),
    };
    let mut queue = CommandQueue::new();
    let mut reboot = RebootIntent::None;
    let mut cursor = Tokens { tokens, pos: 0 };

    while cursor.remaining() > 0 {
        let command = tokens[cursor.pos].as_ref();

        match command {
            "-s" => {
                let args = cursor.take(command, 1)?;
                filter.serial = Some(args[0].to_string());
            }
            "-i" => {
                let args = cursor.take(command, 1)?;
                // Zero means no extra vendor
                let vendor_id = parse_vendor_id(args[0])?;
                filter.vendor_id = (vendor_id != 0).then_some(vendor_id);
            }
            "getvar" => {
                let args = cursor.take(command, 1)?;
                queue.display(args[0], args[0]);
            }
            "erase" => {
                let args = cursor.take(command, 1)?;
                queue.erase(args[0]);
            }
            "signature" => {
                let args = cursor.take(command, 1)?;
                let data = load_file(Path::new(args[0]))?;
                if data.len() != SIGNATURE_SIZE {
                    return Err(Error::Argument(format!(
                        "signature must be {} bytes",
                        SIGNATURE_SIZE
                    )));
                }
                queue.download("signature", data);
                queue.command("signature", "installing signature");
            }
            "reboot" => {
                cursor.take(command, 0)?;
                reboot = reboot.request(RebootIntent::Reboot);
            }
            "reboot-bootloader" => {
                cursor.take(command, 0)?;
                reboot = reboot.request(RebootIntent::RebootBootloader);
            }
            "continue" => {
                cursor.take(command, 0)?;
                queue.command("continue", "resuming boot");
            }
            "flash" => {
                let args = cursor.take(command, 2)?;
                let data = load_file(Path::new(args[1]))?;
                queue.flash(args[0], data);
            }
            "flashall" => {
                let args = cursor.take(command, 1)?;
                queue.extend(plan_package(Path::new(args[0]))?);
                reboot = reboot.request(RebootIntent::Reboot);
            }
            "oem" => {
                let words = cursor.take_rest();
                if words.len() > 1 {
                    queue.command(&words.join(" "), "");
                } else {
                    log::warn!("'oem' given without a command, ignoring");
                }
            }
            other => return Err(Error::Usage(format!("unknown command '{}'", other))),
        }
    }

    reboot.resolve(&mut queue);

    Ok(Invocation { filter, queue })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueuedOperation;
    use crate::testutil::{build_zip, scratch_file};

    fn ops(invocation: &Invocation) -> Vec<&QueuedOperation> {
        invocation.queue.iter().collect()
    }

    #[test]
    fn test_parse_vendor_id() {
        assert_eq!(parse_vendor_id("0x18d1").unwrap(), 0x18d1);
        assert_eq!(parse_vendor_id("0X18D1").unwrap(), 0x18d1);
        assert_eq!(parse_vendor_id("6353").unwrap(), 6353);
        assert_eq!(parse_vendor_id("0777").unwrap(), 0o777);
        assert_eq!(parse_vendor_id("0").unwrap(), 0);
        assert_eq!(parse_vendor_id("65535").unwrap(), 0xffff);
    }

    #[test]
    fn test_parse_vendor_id_invalid() {
        for bad in ["zzz", "", "0x", "65536", "0x10000", "12ab", "089", "-1", "0x18d1 "] {
            let err = parse_vendor_id(bad).unwrap_err();
            assert!(matches!(err, Error::Argument(_)), "{:?} should be rejected", bad);
        }
        assert_eq!(
            parse_vendor_id("zzz").unwrap_err().to_string(),
            "invalid vendor id 'zzz'"
        );
    }

    #[test]
    fn test_empty_line() {
        let inv = build_queue::<&str>(&[], None).unwrap();
        assert!(inv.queue.is_empty());
        assert_eq!(inv.filter, MatchFilter::any());
    }

    #[test]
    fn test_serial_and_vendor_options() {
        let inv = build_queue(&["-s", "ABC", "-i", "0x1234"], None).unwrap();
        assert_eq!(inv.filter.serial.as_deref(), Some("ABC"));
        assert_eq!(inv.filter.vendor_id, Some(0x1234));
        assert!(inv.queue.is_empty());
    }

    #[test]
    fn test_default_serial() {
        let inv = build_queue(&["getvar", "version"], Some("ENV".to_string())).unwrap();
        assert_eq!(inv.filter.serial.as_deref(), Some("ENV"));

        let inv = build_queue(&["-s", "CLI"], Some("ENV".to_string())).unwrap();
        assert_eq!(inv.filter.serial.as_deref(), Some("CLI"));

        let inv = build_queue(&["continue"], Some(String::new())).unwrap();
        assert_eq!(inv.filter.serial, None);
    }

    #[test]
    fn test_zero_vendor_id_is_no_override() {
        for zero in ["0", "0x0", "00"] {
            let inv = build_queue(&["-i", zero], None).unwrap();
            assert_eq!(inv.filter.vendor_id, None);
        }

        let vendor_zero = crate::device::DeviceDescriptor {
            vendor_id: 0,
            class: 0xff,
            subclass: 0x42,
            protocol: 0x03,
            serial: "X".to_string(),
            writable: true,
        };
        let inv = build_queue(&["-i", "0"], None).unwrap();
        assert!(!crate::device::matches(&vendor_zero, &inv.filter));
    }

    #[test]
    fn test_invalid_vendor_id() {
        let err = build_queue(&["-i", "zzz", "getvar", "version"], None).unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
    }

    #[test]
    fn test_simple_commands_in_order() {
        let inv = build_queue(
            &["getvar", "product", "erase", "cache", "continue", "getvar", "version"],
            None,
        )
        .unwrap();

        assert_eq!(
            ops(&inv),
            [
                &QueuedOperation::Display {
                    variable: "product".into(),
                    label: "product".into()
                },
                &QueuedOperation::Erase {
                    partition: "cache".into()
                },
                &QueuedOperation::Command {
                    command: "continue".into(),
                    message: "resuming boot".into()
                },
                &QueuedOperation::Display {
                    variable: "version".into(),
                    label: "version".into()
                },
            ]
        );
    }

    #[test]
    fn test_flash() {
        let path = scratch_file("builder-out.img", &[0xAA; 10]);
        let inv = build_queue(&["flash", "boot", path.to_str().unwrap()], None).unwrap();

        assert_eq!(inv.queue.len(), 1);
        match inv.queue.last().unwrap() {
            QueuedOperation::Flash { partition, data } => {
                assert_eq!(partition, "boot");
                assert_eq!(data.len(), 10);
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_flash_missing_file() {
        let err = build_queue(&["flash", "boot", "/nonexistent/boot.img"], None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_missing_arguments() {
        let lines: [&[&str]; 7] = [
            &["flash", "boot"],
            &["erase"],
            &["getvar"],
            &["-s"],
            &["-i"],
            &["signature"],
            &["flashall"],
        ];
        for line in lines {
            let err = build_queue(line, None).unwrap_err();
            assert!(err.is_usage(), "{:?} should be a usage error", line);
        }
    }

    #[test]
    fn test_unknown_command() {
        let err = build_queue(&["getvar", "version", "frobnicate"], None).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_devices_is_not_a_queue_command() {
        assert!(build_queue(&["devices"], None).unwrap_err().is_usage());
    }

    #[test]
    fn test_signature() {
        let path = scratch_file("builder-sig-256.bin", &[0x55; 256]);
        let inv = build_queue(&["signature", path.to_str().unwrap()], None).unwrap();

        let ops = ops(&inv);
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], QueuedOperation::Download { tag, data } if tag == "signature" && data.len() == 256));
        assert_eq!(
            ops[1],
            &QueuedOperation::Command {
                command: "signature".into(),
                message: "installing signature".into()
            }
        );
    }

    #[test]
    fn test_signature_wrong_size() {
        let path = scratch_file("builder-sig-255.bin", &[0x55; 255]);
        let err = build_queue(&["signature", path.to_str().unwrap()], None).unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
        assert_eq!(err.to_string(), "signature must be 256 bytes");
    }

    #[test]
    fn test_reboot_is_last() {
        let inv = build_queue(&["reboot", "erase", "cache"], None).unwrap();
        assert_eq!(inv.queue.len(), 2);
        assert_eq!(inv.queue.last(), Some(&QueuedOperation::Reboot));
    }

    #[test]
    fn test_reboot_bootloader() {
        let inv = build_queue(&["reboot-bootloader"], None).unwrap();
        assert_eq!(
            ops(&inv),
            [&QueuedOperation::Command {
                command: "reboot-bootloader".into(),
                message: "rebooting into bootloader".into()
            }]
        );
    }

    #[test]
    fn test_reboot_wins_over_reboot_bootloader() {
        for line in [["reboot", "reboot-bootloader"], ["reboot-bootloader", "reboot"]] {
            let inv = build_queue(&line, None).unwrap();
            assert_eq!(ops(&inv), [&QueuedOperation::Reboot]);
        }
    }

    #[test]
    fn test_repeated_reboot_queued_once() {
        let inv = build_queue(&["reboot", "reboot"], None).unwrap();
        assert_eq!(ops(&inv), [&QueuedOperation::Reboot]);
    }

    #[test]
    fn test_oem_consumes_rest() {
        let inv = build_queue(&["erase", "cache", "oem", "unlock", "reboot"], None).unwrap();
        assert_eq!(inv.queue.len(), 2);
        assert_eq!(
            inv.queue.last(),
            Some(&QueuedOperation::Command {
                command: "oem unlock reboot".into(),
                message: String::new()
            })
        );
    }

    #[test]
    fn test_oem_without_words() {
        let inv = build_queue(&["oem"], None).unwrap();
        assert!(inv.queue.is_empty());
    }

    fn package(entries: &[(&str, &[u8])], name: &str) -> String {
        let path = scratch_file(name, &build_zip(entries));
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_flashall_adds_single_reboot() {
        let pkg = package(
            &[
                ("dnx.bin", b"1"),
                ("ifwi.bin", b"2"),
                ("stitch.normalos.bin", b"3"),
                ("stitch.preos.bin", b"4"),
                ("platform.img.gz", b"5"),
            ],
            "builder-full.zip",
        );

        let inv = build_queue(&["flashall", pkg.as_str()], None).unwrap();
        // Separator, two displays, separator, five flashes, reboot
        assert_eq!(inv.queue.len(), 10);
        assert_eq!(inv.queue.last(), Some(&QueuedOperation::Reboot));

        let inv = build_queue(&["reboot", "flashall", pkg.as_str(), "reboot"], None).unwrap();
        let reboots = inv
            .queue
            .iter()
            .filter(|op| **op == QueuedOperation::Reboot)
            .count();
        assert_eq!(reboots, 1);
        assert_eq!(inv.queue.last(), Some(&QueuedOperation::Reboot));
    }

    #[test]
    fn test_flashall_missing_entry() {
        let pkg = package(
            &[
                ("dnx.bin", b"1"),
                ("stitch.normalos.bin", b"3"),
                ("stitch.preos.bin", b"4"),
                ("platform.img.gz", b"5"),
            ],
            "builder-no-ifwi.zip",
        );

        let err = build_queue(&["flashall", pkg.as_str()], None).unwrap_err();
        assert!(matches!(err, Error::Package(_)));
        assert!(err.to_string().contains("ifwi.bin"));
    }
}
