//! Loan Eligibility CLI - train models and assess applications

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use loan_eligibility::artifacts::ArtifactStore;
use loan_eligibility::data::schema::{self, check_bounds};
use loan_eligibility::training::{Trainer, TrainingConfig, TrainingReport};
use loan_eligibility::{InferenceContext, LoanApplication, LoanAssessment, LoanDataset, LoanError};

/// Default artifact directory (relative to the working directory)
const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_DATASET: &str = "loan_eligibility_dataset.csv";

#[derive(Parser)]
#[command(name = "loan-cli")]
#[command(author, version, about = "Loan eligibility prediction CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run the interactive application form
    #[arg(short, long)]
    interactive: bool,

    /// Directory holding trained artifacts
    #[arg(long, default_value = DEFAULT_MODEL_DIR, global = true)]
    model_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the eligibility, interest rate and tenure models
    Train {
        /// Training dataset (CSV)
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        data: PathBuf,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Seed for the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Assess a single application
    Predict(ApplicationArgs),

    /// Show the eligibility criteria reference table
    Criteria,
}

#[derive(clap::Args)]
struct ApplicationArgs {
    /// Age (18-100)
    #[arg(long, default_value = "30")]
    age: f64,
    /// Annual income (₹)
    #[arg(long, default_value = "50000")]
    income: f64,
    /// Monthly expenses (₹)
    #[arg(long, default_value = "5000")]
    expenses: f64,
    /// CIBIL score (300-900)
    #[arg(long, default_value = "750")]
    cibil_score: f64,
    /// Work experience in years (0-50)
    #[arg(long, default_value = "5")]
    experience: f64,
    #[arg(long, default_value = "Permanent")]
    employment_stability: String,
    #[arg(long, default_value = "Salaried")]
    employment_type: String,
    #[arg(long, default_value = "Home Loan")]
    loan_type: String,
    #[arg(long, default_value = "House Purchase")]
    purpose: String,
    #[arg(long, default_value = "Bachelor's")]
    education: String,
    /// Loan amount (₹)
    #[arg(long, default_value = "100000")]
    loan_amount: f64,
    #[arg(long, default_value = "Yes")]
    collateral: String,
    #[arg(long, default_value = "Yes")]
    insurance: String,
    #[arg(long, default_value = "Good")]
    tax_history: String,
    #[arg(long, default_value = "Owned")]
    residence_type: String,
    #[arg(long, default_value = "Urban")]
    residence: String,
    /// Total existing debt (₹)
    #[arg(long, default_value = "0")]
    total_debt: f64,
    /// Annual salary growth in percent (0-20)
    #[arg(long, default_value = "5")]
    salary_growth: f64,
    /// Total assets value (₹)
    #[arg(long, default_value = "200000")]
    total_assets: f64,
}

impl From<ApplicationArgs> for LoanApplication {
    fn from(args: ApplicationArgs) -> Self {
        LoanApplication {
            age: args.age,
            income: args.income,
            expenses: args.expenses,
            cibil_score: args.cibil_score,
            experience: args.experience,
            employment_stability: args.employment_stability,
            employment_type: args.employment_type,
            loan_type: args.loan_type,
            purpose: args.purpose,
            education: args.education,
            loan_amount: args.loan_amount,
            collateral: args.collateral,
            insurance: args.insurance,
            tax_history: args.tax_history,
            residence_type: args.residence_type,
            residence: args.residence,
            total_debt: args.total_debt,
            salary_growth: args.salary_growth,
            total_assets: args.total_assets,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    println!("{}", "Loan Eligibility CLI".cyan().bold());
    println!();

    if cli.interactive {
        run_interactive(&cli.model_dir)?;
    } else if let Some(command) = cli.command {
        match command {
            Commands::Train {
                data,
                test_fraction,
                seed,
            } => {
                run_train(
                    &data,
                    &cli.model_dir,
                    TrainingConfig {
                        test_fraction,
                        seed,
                    },
                )?;
            }
            Commands::Predict(args) => {
                let context = load_context(&cli.model_dir)?;
                predict_application(&context, &args.into())?;
            }
            Commands::Criteria => {
                print_criteria();
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

fn run_train(data: &Path, model_dir: &Path, config: TrainingConfig) -> Result<()> {
    println!("{}: {:?}", "Training from".green(), data);
    println!();

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    pb.set_message("Loading dataset...");
    let dataset = LoanDataset::load(data)
        .with_context(|| format!("Failed to load dataset from {:?}", data))?;
    pb.inc(1);

    pb.set_message(format!("Fitting models on {} rows...", dataset.len()));
    let trained = Trainer::new(config)
        .train(&dataset)
        .context("Training failed")?;
    pb.inc(1);

    pb.set_message("Saving artifacts...");
    let store = ArtifactStore::new(model_dir);
    let paths = trained
        .save(&store)
        .with_context(|| format!("Failed to save artifacts to {:?}", model_dir))?;
    pb.inc(1);
    pb.finish_and_clear();

    print_report(&trained.report);

    println!("{}", "Saved artifacts:".yellow().bold());
    for path in paths {
        println!("  {}", path.display());
    }
    println!();
    println!("{}", "Models and encoders have been saved successfully!".green());

    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!("{}", "Hold-out Evaluation:".yellow().bold());
    println!(
        "Rows: {} total, {} train, {} test",
        report.total_rows, report.train_rows, report.test_rows
    );
    println!("{}", "-".repeat(60));
    println!("{:<16} {}", "Eligibility", report.eligibility);
    println!("{:<16} {}", "Interest rate", report.interest_rate);
    println!("{:<16} {}", "Tenure", report.tenure);
    println!();
}

/// Load trained artifacts, refusing to continue when training has not run
fn load_context(model_dir: &Path) -> Result<InferenceContext> {
    match InferenceContext::load(model_dir) {
        Ok(context) => Ok(context),
        Err(e @ LoanError::MissingArtifact { .. }) => {
            println!("{}", "Models not found!".red().bold());
            println!("Please run the following command first:");
            println!();
            println!("    loan-cli train --data {}", DEFAULT_DATASET);
            println!();
            Err(e.into())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load models from {:?}", model_dir)),
    }
}

fn predict_application(context: &InferenceContext, application: &LoanApplication) -> Result<()> {
    let assessment = match context.assess(application) {
        Ok(assessment) => assessment,
        Err(e) => {
            println!("{}: {}", "An error occurred".red().bold(), e);
            return Err(e.into());
        }
    };

    print_assessment(&assessment);
    Ok(())
}

fn print_assessment(assessment: &LoanAssessment) {
    println!("{}", "Prediction Results:".yellow().bold());
    println!("{}", "-".repeat(60));

    if assessment.eligibility.is_eligible() {
        println!(
            "{}",
            "✅ Congratulations! You are eligible for the loan.".green().bold()
        );
    } else {
        println!(
            "{}",
            "❌ Sorry, you are not eligible for the loan at this time.".red().bold()
        );
    }
    println!(
        "{:<28} {:.1}%",
        "Eligibility confidence",
        assessment.eligible_probability * 100.0
    );
    println!(
        "{:<28} {}",
        "Predicted Interest Rate",
        assessment.interest_rate_display()
    );
    println!(
        "{:<28} {}",
        "Recommended Loan Tenure",
        assessment.tenure_display()
    );
    println!();

    println!("{}", "Analysis:".yellow().bold());
    if !assessment.risk_factors.is_empty() {
        let factors: Vec<String> = assessment
            .risk_factors
            .iter()
            .map(|f| f.to_string())
            .collect();
        println!("{} {}", "Risk Factors:".red(), factors.join(", "));
    }
    println!("💡 Recommendations:");
    println!("  - Maintain a good credit score by paying bills on time");
    println!("  - Keep your debt-to-income ratio low");
    println!("  - Ensure stable employment history");
    println!("  - Build a strong savings record");
}

/// Prompt for a number, checking the field's declared bounds
fn prompt_number(theme: &ColorfulTheme, column: &'static str, prompt: &str, default: f64) -> Result<f64> {
    let value = Input::<f64>::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .validate_with(move |value: &f64| -> Result<(), String> {
            check_bounds(column, *value).map_err(|e| e.to_string())
        })
        .interact_text()?;
    Ok(value)
}

/// Offer only the labels the encoders were fit on
fn prompt_label(
    theme: &ColorfulTheme,
    context: &InferenceContext,
    column: &str,
    prompt: &str,
) -> Result<String> {
    let labels = context
        .registry()
        .labels(column)
        .ok_or_else(|| LoanError::MissingField(column.to_string()))?;

    let selection = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(labels)
        .default(0)
        .interact()?;

    Ok(labels[selection].clone())
}

fn collect_application(theme: &ColorfulTheme, context: &InferenceContext) -> Result<LoanApplication> {
    println!("{}", "Personal Information".yellow().bold());
    let age = prompt_number(theme, schema::AGE, "Age", 30.0)?;
    let income = prompt_number(theme, schema::INCOME, "Annual Income (₹)", 50_000.0)?;
    let expenses = prompt_number(theme, schema::EXPENSES, "Monthly Expenses (₹)", 5_000.0)?;
    let cibil_score = prompt_number(theme, schema::CIBIL_SCORE, "CIBIL Score", 750.0)?;
    let experience = prompt_number(theme, schema::EXPERIENCE, "Work Experience (Years)", 5.0)?;
    let employment_stability =
        prompt_label(theme, context, schema::EMPLOYMENT_STABILITY, "Employment Stability")?;
    let employment_type = prompt_label(theme, context, schema::EMPLOYMENT_TYPE, "Employment Type")?;
    let education = prompt_label(theme, context, schema::EDUCATION, "Education")?;

    println!();
    println!("{}", "Loan Information".yellow().bold());
    let loan_type = prompt_label(theme, context, schema::LOAN_TYPE, "Loan Type")?;
    let purpose = prompt_label(theme, context, schema::PURPOSE, "Loan Purpose")?;
    let loan_amount = prompt_number(theme, schema::LOAN_AMOUNT, "Loan Amount (₹)", 100_000.0)?;
    let total_debt = prompt_number(theme, schema::TOTAL_DEBT, "Total Existing Debt (₹)", 0.0)?;
    let salary_growth =
        prompt_number(theme, schema::SALARY_GROWTH, "Annual Salary Growth (%)", 5.0)?;
    let total_assets =
        prompt_number(theme, schema::TOTAL_ASSETS, "Total Assets Value (₹)", 200_000.0)?;
    let collateral = prompt_label(theme, context, schema::COLLATERAL, "Collateral Available")?;
    let insurance = prompt_label(theme, context, schema::INSURANCE, "Insurance")?;
    let tax_history = prompt_label(theme, context, schema::TAX_HISTORY, "Tax History")?;
    let residence_type = prompt_label(theme, context, schema::RESIDENCE_TYPE, "Residence Type")?;
    let residence = prompt_label(theme, context, schema::RESIDENCE, "Residence Area")?;

    Ok(LoanApplication {
        age,
        income,
        expenses,
        cibil_score,
        experience,
        employment_stability,
        employment_type,
        loan_type,
        purpose,
        education,
        loan_amount,
        collateral,
        insurance,
        tax_history,
        residence_type,
        residence,
        total_debt,
        salary_growth,
        total_assets,
    })
}

fn run_interactive(model_dir: &Path) -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    println!();

    let context = load_context(model_dir)?;
    let theme = ColorfulTheme::default();

    loop {
        let options = vec!["Assess an application", "Show eligibility criteria", "Quit"];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                let application = collect_application(&theme, &context)?;
                println!();
                // A rejected application should not end the session
                if let Err(e) = predict_application(&context, &application) {
                    println!("{}", format!("{:#}", e).dimmed());
                }
                println!();
            }
            1 => {
                println!();
                print_criteria();
                println!();
            }
            2 => {
                println!("Goodbye!");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

/// Reference table: (feature, minimum expected value, reason)
const CRITERIA: [(&str, &str, &str); 21] = [
    ("Age", "21 years", "Banks typically require applicants to be at least 21"),
    ("Income", "₹25,000/month (₹3,00,000/year)", "Stable income is essential for loan repayment"),
    ("Expenses", "< 50% of income", "Expenses should not exceed 50% of monthly income"),
    ("CIBIL Score", "700+", "A good credit score increases approval chances"),
    ("Experience", "1 year", "At least one year of job experience is required"),
    ("Employment Stability", "Stable", "Stable employment ensures regular income"),
    ("Employment Type", "Salaried or Self-Employed", "Salaried individuals have a higher approval rate"),
    ("Loan Type", "Any", "Loan type does not affect eligibility directly"),
    ("Purpose", "Any", "Purpose does not directly impact eligibility"),
    ("Education", "Graduate or higher", "Higher education increases job stability"),
    ("Loan Amount", "< 50% of Total Assets", "A loan amount lower than assets is safer"),
    ("Loan Tenure", "5+ years", "Longer tenure reduces EMI burden"),
    ("Collateral", "Yes (if loan > ₹5L)", "Collateral is needed for large loans"),
    ("Insurance", "Yes (preferred)", "Having insurance reduces risk"),
    ("Tax History", "Good", "Clean tax history improves eligibility"),
    ("Residence Type", "Owned (preferred)", "Owned residence adds financial stability"),
    ("Interest Rate", "≤ 12%", "Lower interest rates are preferred"),
    ("Residence", "Urban or Semi-Urban", "Rural applicants may face stricter conditions"),
    ("Total Debt", "< 40% of income", "Debt should not exceed 40% of monthly income"),
    ("Salary Growth", "≥ 5% annually", "Growth ensures long-term financial stability"),
    ("Total Assets", "₹5,00,000", "Having assets increases approval chances"),
];

fn print_criteria() {
    println!("{}", "Loan Eligibility Criteria:".yellow().bold());
    println!(
        "{:<22} {:<32} {}",
        "Feature", "Minimum Expected Value", "Reason"
    );
    println!("{}", "-".repeat(110));
    for (feature, minimum, reason) in CRITERIA {
        println!("{:<22} {:<32} {}", feature, minimum, reason.dimmed());
    }
}
