use confkit::{Parameters, TypeTag};

#[derive(Debug, Parameters)]
struct Server {
    #[param(default = 4583, make_int, min = 1, max = 65535, lockable)]
    port: i64,
    #[param(name = "bind", default = "0.0.0.0", not_empty)]
    address: String,
    #[param(must_be = [TypeTag::String])]
    ssl_cert: Option<String>,
    #[param]
    tags: Vec<String>,
}

fn main() {
    let registry = Server::registry();
    let names: Vec<&str> = registry.param_names().collect();
    assert_eq!(names, ["port", "bind", "ssl_cert", "tags"]);
}
