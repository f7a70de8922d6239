//! `cosign build-tx`: assemble a packed transaction file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use cosign::transaction::{proposal_hash, Action, Transaction, TransactionHeader};
use cosign::{PermissionLevel, TimePoint};

/// Parse `account:name:auth1,auth2[:hexdata]`.
pub fn parse_action(arg: &str) -> Result<Action, String> {
    let parts: Vec<&str> = arg.split(':').collect();
    if !(3..=4).contains(&parts.len()) {
        return Err(format!(
            "action '{}' must be account:name:auth1,auth2[:hexdata]",
            arg
        ));
    }

    let account = parts[0].parse().map_err(|e| format!("{}", e))?;
    let name = parts[1].parse().map_err(|e| format!("{}", e))?;
    let authorization = parts[2]
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<PermissionLevel>().map_err(|e| format!("{}", e)))
        .collect::<Result<Vec<_>, _>>()?;
    let data = match parts.get(3) {
        Some(hex_data) => hex::decode(hex_data)
            .map_err(|e| format!("invalid action data '{}': {}", hex_data, e))?,
        None => Vec::new(),
    };

    Ok(Action {
        account,
        name,
        authorization,
        data,
    })
}

/// Build a transaction expiring `expires_in` from `now`.
pub fn build(
    now: TimePoint,
    expires_in: Duration,
    delay_sec: u32,
    actions: Vec<Action>,
) -> Transaction {
    let mut header = TransactionHeader::expiring_at(now.saturating_add(expires_in).to_sec());
    header.delay_sec = delay_sec;
    Transaction::new(header, actions)
}

pub fn execute(
    output: &Path,
    expires_in: &str,
    delay_sec: u32,
    actions: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let expires_in = humantime::parse_duration(expires_in)
        .map_err(|e| format!("invalid --expires-in '{}': {}", expires_in, e))?;
    let actions = actions
        .iter()
        .map(|arg| parse_action(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let trx = build(TimePoint::now(), expires_in, delay_sec, actions);
    let packed = trx.pack()?;
    fs::write(output, &packed)
        .map_err(|e| format!("Failed to write '{}': {}", output.display(), e))?;

    println!("wrote {} ({} bytes)", output.display(), packed.len());
    println!("expiration: {}", trx.header.expiration);
    println!("hash: {}", proposal_hash(&packed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosign::transaction::decode_header;
    use cosign::TimePointSec;
    use tempfile::TempDir;

    #[test]
    fn test_parse_action_with_data() {
        let action = parse_action("eosio.token:transfer:alice@active,bob@owner:0aff").unwrap();
        assert_eq!(action.account.to_string(), "eosio.token");
        assert_eq!(action.name.to_string(), "transfer");
        assert_eq!(
            action.authorization,
            vec![
                "alice@active".parse().unwrap(),
                "bob@owner".parse::<PermissionLevel>().unwrap()
            ]
        );
        assert_eq!(action.data, vec![0x0a, 0xff]);
    }

    #[test]
    fn test_parse_action_without_data() {
        let action = parse_action("eosio:updateauth:alice@owner").unwrap();
        assert!(action.data.is_empty());
        assert_eq!(action.authorization.len(), 1);
    }

    #[test]
    fn test_parse_action_rejects_malformed() {
        assert!(parse_action("eosio:updateauth").is_err());
        assert!(parse_action("eosio:updateauth:alice").is_err());
        assert!(parse_action("eosio:updateauth:alice@owner:zz").is_err());
        assert!(parse_action("a:b:c@d:00:extra").is_err());
    }

    #[test]
    fn test_build_sets_expiration_and_delay() {
        let trx = build(
            TimePoint::from_secs(1_000),
            Duration::from_secs(3_600),
            30,
            vec![],
        );
        assert_eq!(trx.header.expiration, TimePointSec::from_secs(4_600));
        assert_eq!(trx.header.delay_sec, 30);
    }

    #[test]
    fn test_execute_writes_packed_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("trx.bin");

        execute(
            &output,
            "1h",
            0,
            &["eosio.token:transfer:alice@active".to_string()],
        )
        .unwrap();

        let packed = fs::read(&output).unwrap();
        let trx = Transaction::unpack(&packed).unwrap();
        assert_eq!(trx.body.actions.len(), 1);
        assert_eq!(decode_header(&packed).unwrap(), trx.header);
    }

    #[test]
    fn test_execute_rejects_bad_duration() {
        let temp_dir = TempDir::new().unwrap();
        let err = execute(&temp_dir.path().join("trx.bin"), "soon", 0, &[]).unwrap_err();
        assert!(err.to_string().contains("--expires-in"));
    }
}
