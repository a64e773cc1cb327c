use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies.
///
/// Every test gets a fresh in-memory store, an election engine on top of it,
/// and a tracked local client for a server using that engine. Injectable
/// dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::model::election::Election`.
///
/// `#[backend_test(admin)]` and `#[backend_test(voter)]` sign the client in
/// as a freshly registered administrator or voter first, using the example
/// credentials.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Register and sign in an account if needed.
    let maybe_login = match parse_macro_input!(args as Option<Ident>) {
        None => TokenStream2::new(),
        Some(arg) => {
            if arg != "admin" && arg != "voter" {
                return syn::Error::new(arg.span(), "Expected `admin` or `voter`")
                    .into_compile_error()
                    .into();
            }
            let credentials = format_ident!("example_{}", arg);
            quote! {
                let credentials = crate::model::api::auth::Credentials::#credentials();
                election
                    .add_voter(crate::model::api::voter::VoterSpec::#arg(&credentials))
                    .await
                    .unwrap();

                // The response borrows the client, so it must not outlive this block.
                {
                    let response = rocket_client
                        .post(uri!(crate::api::auth::authenticate))
                        .header(rocket::http::ContentType::JSON)
                        .body(rocket::serde::json::json!(credentials).to_string())
                        .dispatch()
                        .await;
                    assert_eq!(rocket::http::Status::Ok, response.status());
                }
            }
        }
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::model::election::Election) {
                log4rs_test_utils::test_logging::init_logging_once_for(
                    ["runoff_backend"],
                    None,
                    None,
                );

                let election = crate::model::election::Election::new(
                    crate::model::store::MemoryStore::shared(),
                );
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_election(election.clone()),
                )
                .await
                .unwrap();

                #maybe_login

                (rocket_client, election)
            }

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                #[allow(unused_variables)]
                let (rocket_client, election) = setup().await;
                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject
/// unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_election = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.get_ident() {
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "Election" {
                        if has_election {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `Election`",
                            ));
                        }
                        has_election = true;
                        args.push(quote! { election });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `election_ident: Election`",
        ));
    }

    Ok(args)
}
