//! Simulated shell transcripts for the educational page.
//!
//! These are static text. Nothing on this page (or anywhere else in the
//! museum) executes commands, reads files, or opens connections.

/// Simulated template-shell transcript: what probing the sandbox looks like.
pub const TEMPLATE_SHELL: &str = "\
SIMULATED TEMPLATE SHELL - No Real System Access
This is a transcript showing simulated template shell behavior.
All commands are simulated and do not execute on the real system.

>>> {% for key in museum_meta() %}
...   {{ key }}
... {% endfor %}
[Simulated output - no real data accessed]

>>> {{ ''.__class__.__mro__[1].__subclasses__() }}
[Simulated - sandbox blocked access to dangerous attributes]
";

/// Simulated OS-shell transcript: what command execution would look like.
pub const OS_SHELL: &str = "\
SIMULATED OS SHELL - No Real System Access
This is a transcript showing simulated OS command execution.
All commands are simulated and do not execute on the real system.

$ ls -la
[Simulated directory listing - no real files accessed]

$ cat /etc/passwd
[Simulated - file access blocked by sandbox]

$ whoami
[Simulated - no real process execution]

Note: This is a controlled environment for demonstrating SSTI vulnerabilities
without actual system compromise.
";
