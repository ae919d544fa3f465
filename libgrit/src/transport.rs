use crate::error::{GritError, GritResult};
use crate::hash::Oid;
use crate::odb::ObjectStore;
use crate::protocol;
use crate::reachability;
use std::collections::HashSet;

const ZERO_OID_HEX: &str = "0000000000000000000000000000000000000000";

/// the outcome of a push, reported back to the command layer for the
/// `updating remote ...` message (§6).
pub struct PushReport {
    pub remote_tip: Option<Oid>,
    pub local_tip: Oid,
    pub object_count: usize,
}

fn basic_auth_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::new()
}

/// GETs the ref advertisement and extracts the remote branch tip, or
/// `None` if the remote has no commits on this branch yet (§4.E step 1).
fn fetch_remote_tip(
    client: &reqwest::blocking::Client,
    url: &str,
    branch: &str,
    username: &str,
    password: &str,
) -> GritResult<Option<Oid>> {
    let response = client
        .get(format!("{}/info/refs?service=git-receive-pack", url))
        .basic_auth(username, Some(password))
        .send()
        .map_err(|e| GritError::HttpFailure(e.to_string()))?;
    if !response.status().is_success() {
        return Err(GritError::HttpFailure(format!("info/refs returned {}", response.status())));
    }
    let body = response.bytes().map_err(|e| GritError::HttpFailure(e.to_string()))?;
    let lines = protocol::extract_lines(&body)?;
    parse_ref_advertisement(&lines, branch)
}

/// parses the three pkt-lines of a ref advertisement (§4.E step 1): the
/// service announcement, a flush, then either the zero id (no commits on
/// this branch yet) or `"<40-hex> refs/heads/<branch>\0<capabilities>"`.
fn parse_ref_advertisement(lines: &[Vec<u8>], branch: &str) -> GritResult<Option<Oid>> {
    if lines.len() < 3 {
        return Err(GritError::ProtocolViolation("ref advertisement too short".to_owned()));
    }
    let service_line = std::str::from_utf8(&lines[0]).map_err(|e| anyhow!(e))?;
    if !service_line.starts_with("# service=git-receive-pack") {
        return Err(GritError::ProtocolViolation(format!(
            "unexpected service announcement `{}`",
            service_line
        )));
    }
    if !lines[1].is_empty() {
        return Err(GritError::ProtocolViolation("expected flush after service line".to_owned()));
    }

    let ref_line = std::str::from_utf8(&lines[2]).map_err(|e| anyhow!(e))?;
    let (oid_hex, rest) = ref_line
        .split_once(' ')
        .ok_or_else(|| GritError::ProtocolViolation(format!("malformed ref line `{}`", ref_line)))?;
    let ref_name = rest.split(['\0', '\n']).next().unwrap_or(rest);
    if !ref_name.ends_with(branch) {
        return Err(GritError::ProtocolViolation(format!(
            "ref advertisement names `{}`, expected branch `{}`",
            ref_name, branch
        )));
    }
    if oid_hex == ZERO_OID_HEX {
        Ok(None)
    } else {
        Ok(Some(oid_hex.parse()?))
    }
}

/// the single pkt-line body of a `git-receive-pack` request: the old tip
/// (or all-zeroes), the new tip, the ref name, and `report-status` (§4.E
/// step 3).
fn build_update_command(remote_tip: Option<Oid>, local_tip: Oid, branch: &str) -> String {
    let remote_hex = remote_tip.map(|oid| oid.to_hex()).unwrap_or_else(|| ZERO_OID_HEX.to_owned());
    format!("{} {} refs/heads/{}\0 report-status", remote_hex, local_tip, branch)
}

/// POSTs the ref-update command and the pack, then checks the
/// `unpack ok` / `ok refs/heads/<branch>` response (§4.E steps 3-4).
fn post_pack(
    client: &reqwest::blocking::Client,
    url: &str,
    branch: &str,
    remote_tip: Option<Oid>,
    local_tip: Oid,
    pack: &[u8],
    username: &str,
    password: &str,
) -> GritResult<()> {
    let command = build_update_command(remote_tip, local_tip, branch);
    let mut body = protocol::build_lines_data(&[command]);
    body.extend_from_slice(pack);

    let response = client
        .post(format!("{}/git-receive-pack", url))
        .basic_auth(username, Some(password))
        .body(body)
        .send()
        .map_err(|e| GritError::HttpFailure(e.to_string()))?;
    if !response.status().is_success() {
        return Err(GritError::HttpFailure(format!("git-receive-pack returned {}", response.status())));
    }
    let bytes = response.bytes().map_err(|e| GritError::HttpFailure(e.to_string()))?;
    let lines = protocol::extract_lines(&bytes)?;

    let unpack_ok = lines.first().map(|l| l.starts_with(b"unpack ok")).unwrap_or(false);
    let branch_ok =
        lines.get(1).map(|l| l == format!("ok refs/heads/{}\n", branch).as_bytes()).unwrap_or(false);
    if !unpack_ok || !branch_ok {
        return Err(GritError::ProtocolViolation(format!(
            "push rejected: {:?}",
            lines.iter().map(|l| String::from_utf8_lossy(l).into_owned()).collect::<Vec<_>>()
        )));
    }
    Ok(())
}

/// `push`: the full smart-HTTP receive-pack exchange for one branch (§4.E).
pub fn push(
    odb: &ObjectStore,
    url: &str,
    branch: &str,
    local_tip: Oid,
    username: &str,
    password: &str,
) -> GritResult<PushReport> {
    let client = basic_auth_client();
    let remote_tip = fetch_remote_tip(&client, url, branch, username, password)?;

    let missing: HashSet<Oid> = reachability::find_missing(odb, local_tip, remote_tip)?;
    let object_count = missing.len();
    let pack = crate::pack::create_pack(odb, missing)?;

    post_pack(&client, url, branch, remote_tip, local_tip, &pack, username, password)?;
    Ok(PushReport { remote_tip, local_tip, object_count })
}
