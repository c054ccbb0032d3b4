use console::style;
use covdash::format::usage::create_usage_summary;
use covdash::services::plan::{
    account_details_key, fetch_account_details, fetch_plan_page_data, plan_page_key,
};
use covdash::services::providers::{fetch_service_providers, service_providers_key};

use super::shared::{Context, FieldDisplay, OutputFormat, OwnerArgs, or_dash, print_rows};

#[derive(Debug, clap::Args)]
pub(crate) struct PlanArgs {
    #[command(flatten)]
    pub(crate) owner: OwnerArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

pub(crate) async fn handle_plan(
    args: PlanArgs,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let OwnerArgs { provider, owner } = &args.owner;

    let account_key = account_details_key(provider, owner);
    let plan_key = plan_page_key(provider, owner);
    let (account, plan_data) = tokio::try_join!(
        ctx.queries.fetch(&account_key, || {
            fetch_account_details(&ctx.api, provider, owner, None)
        }),
        ctx.queries.fetch(&plan_key, || {
            fetch_plan_page_data(&ctx.api, provider, owner, None)
        }),
    )?;

    let summary = create_usage_summary(
        &account,
        (*plan_data).as_ref(),
        account.plan.is_basic(),
    );

    let mut fields = vec![
        FieldDisplay::new(
            "Plan",
            or_dash(
                account
                    .plan
                    .marketing_name
                    .as_deref()
                    .or(account.plan.value.as_deref()),
            ),
        ),
        FieldDisplay::new("Members", summary.active_users.clone()),
    ];
    if let Some(uploads) = &summary.uploads {
        let label = uploads.label();
        let label = if uploads.exceeded {
            style(label).red().to_string()
        } else {
            label
        };
        fields.push(FieldDisplay::new("Uploads", label));
    }
    print_rows(fields, &summary, args.output, "")?;
    Ok(())
}

#[derive(Debug, Clone, tabled::Tabled)]
struct ProviderDisplay {
    #[tabled(rename = "Login provider")]
    name: String,
}

pub(crate) async fn handle_providers(
    output: OutputFormat,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let providers = ctx
        .queries
        .fetch(&service_providers_key(), || {
            fetch_service_providers(&ctx.api, None)
        })
        .await?;

    let display = providers
        .provider_list
        .iter()
        .map(|name| ProviderDisplay { name: name.clone() })
        .collect();
    print_rows(
        display,
        providers.as_ref(),
        output,
        "No login providers are enabled on this instance.",
    )?;
    Ok(())
}
