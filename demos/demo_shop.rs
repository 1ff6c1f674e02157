use arbor::prelude::*;
use arbor::{
    AllowAll, Command, CommandError, CommandInput, CommandTree, ConsoleInvoker, FirstOf,
    InvokerKind, Literal, Scalar, SenderName, Suggestions, Text,
};

fn main() {
    let tree = shop();
    let console = ConsoleInvoker::default();
    let mut tokens: Vec<String> = std::env::args().skip(1).collect();

    if tokens.first().map(String::as_str) == Some("--complete") {
        tokens.remove(0);
        let input = CommandInput::new(&console, &AllowAll, "shop", tokens);

        match tree.complete(&input) {
            Suggestions::Candidates(candidates) => println!("{}", candidates.join(" ")),
            Suggestions::HostDefault => println!("<host default>"),
        }
    } else {
        let input = CommandInput::new(&console, &AllowAll, "shop", tokens);

        if !tree.handle_command(&input) {
            std::process::exit(1);
        }
    }
}

fn shop() -> CommandTree {
    Command::new("shop")
        .alias("s")
        .description("Manage shops.")
        .child(
            Command::new("give")
                .alias("grant")
                .description("Give items to a player.")
                .argument(
                    Scalar::<String>::new("player")
                        .suggest(["alice", "bob"])
                        .filter(|player: &String| player == "alice" || player == "bob")
                        .or_fallback(SenderName::new("self").requiring(InvokerKind::Console)),
                )
                .argument(Scalar::<u32>::new("amount").suggest(["1", "16", "64"]).or_default(1u32))
                .argument(
                    FirstOf::new("item")
                        .or(Literal::new("hand"))
                        .or(Scalar::<String>::new("material").suggest(["stone", "sand"])),
                )
                .executes(|input, results| {
                    let player = results.get_as::<String>("player").unwrap();
                    let amount = results.get_as::<u32>("amount").unwrap();
                    let item = results.get_as::<String>("item").unwrap();
                    input
                        .invoker()
                        .send_message(&format!("Gave {amount} {item} to {player}."));
                    Ok(())
                }),
        )
        .child(
            Command::new("remove")
                .alias("delete")
                .description("Remove the shop with the given id.")
                .argument(Scalar::<u32>::new("id"))
                .executes(|input, results| match results.get_as::<u32>("id") {
                    Some(0) => Err(CommandError::execution("There is no shop 0.")),
                    Some(id) => {
                        input.invoker().send_message(&format!("Removed shop {id}."));
                        Ok(())
                    }
                    None => unreachable!("internal error - a required argument must be present"),
                }),
        )
        .child(
            Command::new("announce")
                .description("Announce a message to every shop.")
                .argument(Text::new("message"))
                .executes(|input, results| {
                    let message = results.get_as::<String>("message").unwrap();
                    input.invoker().send_message(&format!("[shop] {message}"));
                    Ok(())
                }),
        )
        .build()
}
