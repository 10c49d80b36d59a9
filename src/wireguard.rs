//! WireGuard configuration rendering

use crate::account::PersistedState;

pub const DNS: &str = "1.1.1.1";
pub const MTU: u16 = 1280;

/// Render the `cf-warp.conf` body for a credential document.
/// Pure: the same state always yields byte-identical text.
pub fn render(state: &PersistedState) -> String {
    let tunnel = &state.credential.tunnel;
    format!(
        "[Interface]\n\
         PrivateKey = {private_key}\n\
         Address = {v4}/32\n\
         Address = {v6}/128\n\
         DNS = {dns}\n\
         MTU = {mtu}\n\
         \n\
         [Peer]\n\
         PublicKey = {peer}\n\
         AllowedIPs = 0.0.0.0/0\n\
         AllowedIPs = ::/0\n\
         Endpoint = {endpoint}\n",
        private_key = state.keypair.private_key,
        v4 = tunnel.address_v4,
        v6 = tunnel.address_v6,
        dns = DNS,
        mtu = MTU,
        peer = tunnel.peer_public_key,
        endpoint = tunnel.endpoint,
    )
}
