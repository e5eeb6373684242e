//! Module path helpers.

use crate::error::LocusResult;
use crate::target::TargetModule;

/// Prefix of module paths that are only meaningful inside the debuggee.
const PROC_SELF_PREFIX: &str = "/proc/self/";

/// File-name component of a path, splitting on both `/` and `\`.
///
/// ```rust
/// use locus_core::modules::path::file_name;
///
/// assert_eq!(file_name("/app/bin/App.dll"), "App.dll");
/// assert_eq!(file_name("C:\\app\\App.dll"), "App.dll");
/// assert_eq!(file_name("App.dll"), "App.dll");
/// ```
pub fn file_name(path: &str) -> &str
{
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}

/// Rewrite a `/proc/self/...` path so it points into the debuggee's `/proc`
/// entry instead of ours. Other paths are returned unchanged.
pub fn rewrite_proc_self(path: &str, pid: u32) -> String
{
    match path.strip_prefix(PROC_SELF_PREFIX) {
        Some(rest) => format!("/proc/{pid}/{rest}"),
        None => path.to_string(),
    }
}

/// Path of a module as seen from the debugger process.
///
/// Runtimes that load assemblies through an open file descriptor report paths
/// like `/proc/self/fd/8/bin/App.dll`; `self` there is the debuggee, so it is
/// replaced with the debuggee's PID. The PID is only queried when needed.
pub fn module_path(module: &dyn TargetModule) -> LocusResult<String>
{
    let name = module.name()?;
    if !name.starts_with(PROC_SELF_PREFIX) {
        return Ok(name);
    }
    let pid = module.process_id()?;
    Ok(rewrite_proc_self(&name, pid))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_file_name_handles_trailing_separator()
    {
        assert_eq!(file_name("/app/bin/"), "");
        assert_eq!(file_name(""), "");
    }

    #[test]
    fn test_rewrite_proc_self()
    {
        assert_eq!(
            rewrite_proc_self("/proc/self/fd/8/bin/Xamarin.Forms.dll", 4242),
            "/proc/4242/fd/8/bin/Xamarin.Forms.dll"
        );
        assert_eq!(rewrite_proc_self("/proc/selfish/App.dll", 1), "/proc/selfish/App.dll");
        assert_eq!(rewrite_proc_self("/app/App.dll", 1), "/app/App.dll");
    }
}
