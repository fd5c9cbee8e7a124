/// Shared description of the reply format both generation modes ask for.
const REPLY_FORMAT: &str = r#"Reply with JSON only, no prose and no Markdown. Use this shape:
{
  "scriptName": "NameOfTheScript",
  "scriptType": "Script|LocalScript|ModuleScript",
  "parent": "ServerScriptService|StarterPlayerScripts|ReplicatedStorage|Workspace",
  "code": "-- Luau source"
}
If several scripts are needed, reply with an array of such objects."#;

/// System instruction for `fast` mode: short, focused scripts.
pub fn fast_instruction() -> String {
    format!(
        r#"You are an expert Roblox Luau programmer.
Write working Roblox code for the user's request that runs in Roblox Studio without changes.
Keep it short: the fewest scripts that solve the request, with brief comments.

{REPLY_FORMAT}
"#
    )
}

/// System instruction for `full` mode: complete, structured systems.
pub fn full_instruction() -> String {
    format!(
        r#"You are an expert Roblox Luau programmer building complete game systems.
Write production-quality Roblox code for the user's request that runs in Roblox Studio without changes.
Follow modern Roblox practices:
- Use --!strict and type annotations
- Split shared logic into ModuleScripts in ReplicatedStorage
- Keep server authority: validate every RemoteEvent on the server
- Comment the non-obvious parts

{REPLY_FORMAT}
"#
    )
}

/// System instruction for the plain-code endpoint.
pub fn simple_instruction() -> &'static str {
    "You are an expert Roblox Luau programmer. Reply with working Luau code only. No explanations, only code."
}
