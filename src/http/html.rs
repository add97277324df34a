//! Page served by `/config` when the portal page can't be read from disk.

pub const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Device configuration</title>
    <style>
        body { font-family: sans-serif; max-width: 480px; margin: 0 auto; padding: 20px; }
        pre { background: #f4f4f4; padding: 12px; overflow-x: auto; }
        textarea { width: 100%; min-height: 200px; font-family: monospace; }
        button { padding: 10px 16px; margin-top: 8px; }
    </style>
</head>
<body>
    <h1>Device configuration</h1>
    <p>The configuration page could not be loaded. The raw configuration can still be edited
    below.</p>
    <textarea id="config"></textarea>
    <button id="save">Save</button>
    <button id="display">Toggle display</button>
    <pre id="message"></pre>
    <script>
        const message = document.getElementById('message');
        fetch('/data')
            .then(r => r.json())
            .then(data => {
                document.getElementById('config').value = JSON.stringify(data, null, 2);
            });
        document.getElementById('save').onclick = () => {
            fetch('/data', { method: 'POST', body: document.getElementById('config').value })
                .then(r => r.text())
                .then(t => { message.textContent = t; });
        };
        document.getElementById('display').onclick = () => {
            fetch('/display').then(r => r.text()).then(t => { message.textContent = t; });
        };
    </script>
</body>
</html>
"#;
