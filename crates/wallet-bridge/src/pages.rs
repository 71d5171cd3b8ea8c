//! Wallet pages
//!
//! Self-contained HTML/JS pages that drive the injected EIP-1193 provider
//! (`window.ethereum`) and post the outcome back to `/callback/{id}`.

const PAGE_STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: linear-gradient(160deg, #0b1d3a 0%, #0052ff 140%);
    min-height: 100vh;
    display: flex; align-items: center; justify-content: center;
    color: #fff;
}
.card {
    background: rgba(255,255,255,0.06);
    border: 1px solid rgba(255,255,255,0.12);
    border-radius: 20px;
    padding: 36px; max-width: 460px; width: 90%;
    text-align: center;
}
h1 { font-size: 22px; margin-bottom: 8px; }
.subtitle { color: rgba(255,255,255,0.7); margin-bottom: 28px; font-size: 14px; }
.status {
    padding: 18px; border-radius: 10px; margin-bottom: 20px;
    display: flex; align-items: center; justify-content: center; gap: 8px;
}
.status.loading { background: rgba(0, 82, 255, 0.25); }
.status.success { background: rgba(34, 197, 94, 0.25); }
.status.error { background: rgba(239, 68, 68, 0.25); }
.spinner {
    width: 18px; height: 18px;
    border: 2px solid rgba(255,255,255,0.3); border-top-color: #fff;
    border-radius: 50%; animation: spin 1s linear infinite;
}
@keyframes spin { to { transform: rotate(360deg); } }
.mono {
    font-family: monospace; font-size: 12px; word-break: break-all;
    background: rgba(0,0,0,0.3); padding: 8px 12px; border-radius: 6px; margin-top: 12px;
}
.hidden { display: none; }
"#;

/// Shared page helpers: status rendering, callback posting, chain switching
const PAGE_SCRIPT_PRELUDE: &str = r#"
const statusEl = document.getElementById('status');
const statusText = document.getElementById('status-text');
const spinner = document.getElementById('spinner');
const resultEl = document.getElementById('result');

function setStatus(text, type, busy) {
    statusText.textContent = text;
    statusEl.className = 'status ' + type;
    spinner.style.display = busy ? 'block' : 'none';
}

function showResult(text) {
    resultEl.textContent = text;
    resultEl.classList.remove('hidden');
}

async function postBack(payload) {
    await fetch(BASE_URL + '/callback/' + REQUEST_ID, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload)
    });
}

async function reportError(error) {
    console.error('Wallet error:', error);
    const message = (error && error.message) || 'Unknown error';
    const code = error && typeof error.code === 'number' ? error.code : null;
    try { await postBack({ error: message, code: code }); } catch (e) {}
    setStatus(code === 4001 ? 'Request rejected in wallet' : 'Error: ' + message, 'error', false);
}

async function ensureChain(chainIdHex) {
    const current = await window.ethereum.request({ method: 'eth_chainId' });
    if (current.toLowerCase() === chainIdHex.toLowerCase()) return;
    setStatus('Please switch network in your wallet...', 'loading', true);
    await window.ethereum.request({
        method: 'wallet_switchEthereumChain',
        params: [{ chainId: chainIdHex }]
    });
}

function closeSoon() {
    setTimeout(() => { try { window.close(); } catch (e) {} }, 2000);
}
"#;

fn page_shell(title: &str, subtitle: &str, config_script: &str, flow_script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Cat8004 Minter</title>
    <style>{style}</style>
</head>
<body>
    <div class="card">
        <h1>{title}</h1>
        <p class="subtitle" id="subtitle">{subtitle}</p>
        <div id="status" class="status loading">
            <div class="spinner" id="spinner"></div>
            <span id="status-text">Looking for a browser wallet...</span>
        </div>
        <div id="result" class="mono hidden"></div>
    </div>
    <script>
{config_script}
{prelude}
{flow_script}
    </script>
</body>
</html>"#,
        title = title,
        subtitle = escape_html(subtitle),
        style = PAGE_STYLE,
        config_script = config_script,
        prelude = PAGE_SCRIPT_PRELUDE,
        flow_script = flow_script,
    )
}

/// Generate the connect page.
///
/// The page will:
/// 1. Check for an injected provider
/// 2. Request accounts (user approves)
/// 3. Switch to the sale chain if needed
/// 4. POST the first account to `/callback/{id}`
pub fn generate_connect_page(request_id: &str, chain_id: u64, base_url: &str) -> String {
    let config = format!(
        r#"const REQUEST_ID = "{}";
const BASE_URL = "{}";
const CHAIN_ID = "0x{:x}";"#,
        escape_js_string(request_id),
        escape_js_string(base_url),
        chain_id
    );

    let flow = r#"
async function connectWallet() {
    try {
        await new Promise(r => setTimeout(r, 300));
        if (!window.ethereum) {
            setStatus('No browser wallet detected', 'error', false);
            await postBack({ error: 'No browser wallet detected' });
            return;
        }

        setStatus('Please approve the connection in your wallet...', 'loading', true);
        const accounts = await window.ethereum.request({ method: 'eth_requestAccounts' });
        if (!accounts || accounts.length === 0) {
            await reportError({ message: 'No accounts returned' });
            return;
        }

        await ensureChain(CHAIN_ID);

        setStatus('Connecting to minter...', 'loading', true);
        await postBack({ address: accounts[0] });
        setStatus('Wallet connected!', 'success', false);
        showResult(accounts[0]);
        closeSoon();
    } catch (error) {
        await reportError(error);
    }
}

connectWallet();
"#;

    page_shell(
        "Connect Wallet",
        "Connect your wallet to the Cat8004 minter",
        &config,
        flow,
    )
}

/// Generate the signing page.
///
/// The page will:
/// 1. Fetch the unsigned transaction from `/tx/{id}`
/// 2. Switch to the transaction's chain if needed
/// 3. Send it with `eth_sendTransaction` (user approves)
/// 4. POST the transaction hash, or the error, to `/callback/{id}`
pub fn generate_signing_page(request_id: &str, message: &str, base_url: &str) -> String {
    let config = format!(
        r#"const REQUEST_ID = "{}";
const BASE_URL = "{}";
const MESSAGE = "{}";"#,
        escape_js_string(request_id),
        escape_js_string(base_url),
        escape_js_string(message)
    );

    let flow = r#"
async function sendTransaction() {
    try {
        await new Promise(r => setTimeout(r, 300));
        if (!window.ethereum) {
            setStatus('No browser wallet detected', 'error', false);
            await postBack({ error: 'No browser wallet detected' });
            return;
        }

        setStatus('Fetching transaction...', 'loading', true);
        const response = await fetch(BASE_URL + '/tx/' + REQUEST_ID);
        if (!response.ok) {
            setStatus('Failed to fetch transaction: ' + await response.text(), 'error', false);
            return;
        }
        const tx = await response.json();

        const accounts = await window.ethereum.request({ method: 'eth_requestAccounts' });
        if (!tx.from) tx.from = accounts[0];
        await ensureChain(tx.chainId);

        setStatus('Please confirm in your wallet...', 'loading', true);
        const txHash = await window.ethereum.request({
            method: 'eth_sendTransaction',
            params: [tx]
        });

        await postBack({ txHash: txHash });
        setStatus('Transaction submitted!', 'success', false);
        showResult(txHash);
        closeSoon();
    } catch (error) {
        await reportError(error);
    }
}

sendTransaction();
"#;

    page_shell("Confirm Purchase", message, &config, flow)
}

/// Escape string for safe use in JavaScript
fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
